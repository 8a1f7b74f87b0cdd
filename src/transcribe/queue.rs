use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::store::{ClosedSegment, SegmentKey, SegmentStore};

use super::client::Transcriber;
use super::limiter::RateLimiter;

/// Terminal outcome of one transcription job.
///
/// The raw audio is removed in every terminal outcome; only the sidecar
/// transcript survives a successful job. This is deliberately asymmetric
/// with merge failures, which preserve data.
#[derive(Debug)]
pub enum TranscriptionOutcome {
    /// Sidecar transcript written, audio deleted
    Transcribed { key: SegmentKey },
    /// Remote returned no usable text; audio deleted, no sidecar
    DiscardedEmpty { key: SegmentKey },
    /// Remote call failed; audio deleted anyway, no retry
    DiscardedFailed {
        key: SegmentKey,
        error: anyhow::Error,
    },
}

impl TranscriptionOutcome {
    pub fn key(&self) -> &SegmentKey {
        match self {
            TranscriptionOutcome::Transcribed { key }
            | TranscriptionOutcome::DiscardedEmpty { key }
            | TranscriptionOutcome::DiscardedFailed { key, .. } => key,
        }
    }
}

/// Submits closed segments to the transcription service under the shared
/// rate limiter.
///
/// All segments of a session are submitted concurrently; each independently
/// awaits limiter admission, so completion order is whatever the limiter and
/// remote latency produce. Nothing downstream depends on that order.
pub struct TranscriptionQueue {
    store: Arc<SegmentStore>,
    transcriber: Arc<dyn Transcriber>,
    limiter: Arc<RateLimiter>,
}

impl TranscriptionQueue {
    pub fn new(
        store: Arc<SegmentStore>,
        transcriber: Arc<dyn Transcriber>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            store,
            transcriber,
            limiter,
        }
    }

    /// Submit every closed segment of a session and await all outcomes.
    pub async fn submit_all(&self, session_id: &str) -> Result<Vec<TranscriptionOutcome>> {
        let segments = self.store.list_closed(session_id)?;

        if segments.is_empty() {
            info!("No segments to transcribe for session {}", session_id);
            return Ok(Vec::new());
        }

        info!(
            "Submitting {} segment(s) for transcription (session {})",
            segments.len(),
            session_id
        );

        let jobs = segments
            .into_iter()
            .map(|segment| self.submit(session_id, segment));

        Ok(futures::future::join_all(jobs).await)
    }

    /// One submission: admission, remote call, terminal cleanup.
    async fn submit(&self, session_id: &str, segment: ClosedSegment) -> TranscriptionOutcome {
        let key = segment.key.clone();

        self.limiter.acquire().await;

        let audio = match tokio::fs::read(&segment.path).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Failed to read segment {} for transcription: {}", key, e);
                self.discard_audio(&segment);
                return TranscriptionOutcome::DiscardedFailed {
                    key,
                    error: e.into(),
                };
            }
        };

        info!("Transcribing {}", key);

        let outcome = match self
            .transcriber
            .transcribe(&key.audio_file_name(), audio)
            .await
        {
            Ok(response) => match response.text() {
                Some(text) => {
                    let sidecar = self.store.transcript_path(session_id, &key);
                    match tokio::fs::write(&sidecar, text).await {
                        Ok(()) => {
                            info!("Saved transcript {}", key.transcript_file_name());
                            TranscriptionOutcome::Transcribed { key }
                        }
                        Err(e) => {
                            warn!("Failed to write transcript for {}: {}", key, e);
                            TranscriptionOutcome::DiscardedFailed {
                                key,
                                error: e.into(),
                            }
                        }
                    }
                }
                None => {
                    info!("No text for {}, discarding", key);
                    TranscriptionOutcome::DiscardedEmpty { key }
                }
            },
            Err(error) => {
                warn!("Transcription failed for {}: {:#}", key, error);
                TranscriptionOutcome::DiscardedFailed { key, error }
            }
        };

        // At-most-one-attempt policy: the raw audio goes away regardless of
        // how the submission ended.
        self.discard_audio(&segment);

        outcome
    }

    fn discard_audio(&self, segment: &ClosedSegment) {
        if let Err(e) = self.store.delete(&segment.path) {
            warn!("Failed to delete audio for {}: {:#}", segment.key, e);
        }
    }
}
