pub mod client;
pub mod messages;

pub use client::NatsFrameSource;
pub use messages::{SpeakingEventMessage, VoiceFrameMessage};
