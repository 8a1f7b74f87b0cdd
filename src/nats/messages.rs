use serde::{Deserialize, Serialize};

/// Per-speaker audio frame published by the voice gateway
#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceFrameMessage {
    pub session_id: String,
    pub speaker_id: String,
    pub sequence: u32,
    pub pcm: String,  // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Speaking start/stop signal published by the voice gateway
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakingEventMessage {
    pub session_id: String,
    pub speaker_id: String,
    pub speaking: bool,
    pub timestamp: String,  // RFC3339 timestamp
}
