//! Rate-limited transcription
//!
//! Every submission in the process shares one rolling-window rate limiter,
//! modelling backpressure against the quota-limited remote service. Segments
//! fan out concurrently; the limiter alone decides pacing.

mod client;
mod limiter;
mod queue;

pub use client::{HttpTranscriber, Transcriber, TranscriptionResponse};
pub use limiter::RateLimiter;
pub use queue::{TranscriptionOutcome, TranscriptionQueue};
