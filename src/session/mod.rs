//! Recording session management
//!
//! This module ties the pipeline stages together:
//! - `RecordingSession` owns the live side: speaking events in, per-speaker
//!   captures out
//! - `SessionProcessor` owns the post-capture side: merge, transcription,
//!   handoff
//! - `SessionStats` / `SessionReport` are the caller-facing views

mod config;
mod processor;
mod session;
mod stats;

pub use config::SessionConfig;
pub use processor::SessionProcessor;
pub use session::RecordingSession;
pub use stats::{SessionReport, SessionStats};
