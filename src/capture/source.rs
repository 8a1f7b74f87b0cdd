use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

/// A speaker becoming audible or going quiet
#[derive(Debug, Clone)]
pub struct SpeakingEvent {
    pub speaker_id: String,
    /// true = started speaking, false = stopped
    pub started: bool,
}

/// One speaker's frame sequence.
///
/// The channel closes when the subscription ends: either the transport's
/// silence window elapsed with no frames, or the transport marked the stream
/// final. A closed stream is never restarted; a new subscription is a new
/// sequence.
pub type FrameStream = mpsc::Receiver<AudioFrame>;

/// Transport seam delivering per-speaker audio for one voice session.
///
/// Production implementation: the NATS transport in `crate::nats`. Tests
/// supply channel-backed fakes.
#[async_trait::async_trait]
pub trait VoiceFrameSource: Send + Sync {
    /// Speaking start/stop events for the whole session.
    async fn speaking_events(&self) -> Result<mpsc::Receiver<SpeakingEvent>>;

    /// Subscribe to one speaker's frames.
    ///
    /// The returned stream ends after `silence` of continuous quiet from the
    /// speaker.
    async fn subscribe(&self, speaker_id: &str, silence: Duration) -> Result<FrameStream>;
}
