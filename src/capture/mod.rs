//! Per-speaker capture
//!
//! This module owns segment creation and the open → closed transition:
//! - `VoiceFrameSource` is the transport seam delivering per-speaker frames
//!   and speaking events
//! - `StreamEncoder` turns frames into a playable container file
//! - `CaptureManager` decides segment boundaries (silence end, hard cap) and
//!   writes segments through the store

mod encoder;
mod manager;
mod source;

pub use encoder::{SegmentWriter, StreamEncoder, WavStreamEncoder};
pub use manager::{CaptureConfig, CaptureManager};
pub use source::{AudioFrame, FrameStream, SpeakingEvent, VoiceFrameSource};
