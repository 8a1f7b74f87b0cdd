use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a live recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether capture is currently active
    pub is_recording: bool,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Speakers currently being captured
    pub active_speakers: usize,

    /// Closed segments waiting in the store
    pub segments_closed: usize,
}

/// What processing a finished session accomplished.
///
/// Contained stage faults show up as counts and retained filenames; nothing
/// here aborts the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionReport {
    /// Segments found in the store when processing began
    pub segments: usize,

    /// Merge groups executed (trivial pass-throughs included)
    pub merge_groups: usize,

    /// Groups whose concatenation failed (originals preserved)
    pub merge_failures: usize,

    /// Segments with a transcript sidecar persisted
    pub transcribed: usize,

    /// Segments discarded (empty or failed transcription)
    pub discarded: usize,

    /// Artifacts confirmed in durable storage
    pub uploaded: usize,

    /// Artifacts left locally for the next handoff attempt, with the reason
    pub retained: Vec<String>,
}
