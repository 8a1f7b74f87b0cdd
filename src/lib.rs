pub mod capture;
pub mod config;
pub mod handoff;
pub mod http;
pub mod merge;
pub mod nats;
pub mod session;
pub mod store;
pub mod transcribe;

pub use capture::{
    AudioFrame, CaptureConfig, CaptureManager, FrameStream, SegmentWriter, SpeakingEvent,
    StreamEncoder, VoiceFrameSource, WavStreamEncoder,
};
pub use config::Config;
pub use handoff::{ArtifactUploader, HandoffReport, HandoffRunner, HttpUploader, RetainedArtifact};
pub use http::{create_router, AppState, SessionDeps};
pub use merge::{group_segments, Concatenator, FfmpegConcatenator, MergeExecutor, MergeGroup, MergeOutcome};
pub use nats::{NatsFrameSource, SpeakingEventMessage, VoiceFrameMessage};
pub use session::{RecordingSession, SessionConfig, SessionProcessor, SessionReport, SessionStats};
pub use store::{Artifact, ArtifactKind, ClosedSegment, OpenSegment, SegmentKey, SegmentStore};
pub use transcribe::{
    HttpTranscriber, RateLimiter, Transcriber, TranscriptionOutcome, TranscriptionQueue,
    TranscriptionResponse,
};
