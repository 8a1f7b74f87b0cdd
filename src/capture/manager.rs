use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::store::{OpenSegment, SegmentStore};

use super::encoder::StreamEncoder;
use super::source::{FrameStream, VoiceFrameSource};

/// Capture timing configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Continuous quiet that ends a segment (default: 300 ms)
    pub silence_timeout: Duration,
    /// Wall-clock cap on a single segment; on firing, capture re-opens a new
    /// segment for the same speaker and continues (default: 30 s)
    pub segment_max: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            silence_timeout: Duration::from_millis(300),
            segment_max: Duration::from_secs(30),
        }
    }
}

/// How one segment's frame loop ended
enum SegmentEnd {
    /// Silence window elapsed; the utterance is over
    Silence,
    /// Hard cap fired; finalize and immediately re-open
    HardTimeout,
    /// Encoder/write error; abandon the partial file
    Failed,
}

/// Owns the capture lifecycle for every speaker in one session.
///
/// Invariant: at most one capture task (and therefore one open segment) per
/// speaker at any time. `begin_capture` for a speaker who is already being
/// captured is a no-op, which makes duplicate speaking events harmless.
pub struct CaptureManager {
    session_id: String,
    store: Arc<SegmentStore>,
    source: Arc<dyn VoiceFrameSource>,
    encoder: Arc<dyn StreamEncoder>,
    config: CaptureConfig,
    active: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl CaptureManager {
    pub fn new(
        session_id: String,
        store: Arc<SegmentStore>,
        source: Arc<dyn VoiceFrameSource>,
        encoder: Arc<dyn StreamEncoder>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            session_id,
            store,
            source,
            encoder,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start capturing a speaker, unless a capture is already running.
    pub async fn begin_capture(&self, speaker_id: &str) {
        let mut active = self.active.lock().await;

        if active.contains_key(speaker_id) {
            info!("Already capturing {}, ignoring", speaker_id);
            return;
        }

        info!("Starting capture for {}", speaker_id);

        let session_id = self.session_id.clone();
        let store = Arc::clone(&self.store);
        let source = Arc::clone(&self.source);
        let encoder = Arc::clone(&self.encoder);
        let config = self.config.clone();
        let registry = Arc::clone(&self.active);
        let speaker = speaker_id.to_string();

        let handle = tokio::spawn(async move {
            run_capture_loop(&session_id, &speaker, store, source, encoder, config).await;

            // The task unregisters itself so the next speaking event can
            // start a fresh capture.
            registry.lock().await.remove(&speaker);
        });

        active.insert(speaker_id.to_string(), handle);
    }

    /// Number of speakers currently being captured
    pub async fn active_count(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Wait for all in-flight captures to finish.
    ///
    /// Callers stop issuing new speaking events before draining; in-flight
    /// segments are allowed to finish on their own timeouts.
    pub async fn wait_idle(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut active = self.active.lock().await;
                active.drain().map(|(_, handle)| handle).collect()
            };

            if handles.is_empty() {
                return;
            }

            for handle in handles {
                if let Err(e) = handle.await {
                    error!("Capture task panicked: {}", e);
                }
            }
        }
    }
}

/// Bounded per-speaker capture loop.
///
/// Each iteration records exactly one segment. A hard-timeout split loops
/// around with a fresh subscription and segment; silence or a capture fault
/// exits, and the speaker's next speaking event starts a new loop.
async fn run_capture_loop(
    session_id: &str,
    speaker_id: &str,
    store: Arc<SegmentStore>,
    source: Arc<dyn VoiceFrameSource>,
    encoder: Arc<dyn StreamEncoder>,
    config: CaptureConfig,
) {
    loop {
        let mut frames = match source.subscribe(speaker_id, config.silence_timeout).await {
            Ok(frames) => frames,
            Err(e) => {
                error!("Failed to subscribe to {}: {:#}", speaker_id, e);
                return;
            }
        };

        let open = match store.open_segment(session_id, speaker_id) {
            Ok(open) => open,
            Err(e) => {
                error!("Failed to open segment for {}: {:#}", speaker_id, e);
                return;
            }
        };

        match record_segment(&store, &open, &mut frames, encoder.as_ref(), &config).await {
            SegmentEnd::Silence => return,
            SegmentEnd::HardTimeout => {
                info!(
                    "Segment cap reached for {}, continuing in a new segment",
                    speaker_id
                );
                // Loop around: new subscription, new segment. The grouper
                // recombines the split utterance downstream.
            }
            SegmentEnd::Failed => {
                store.abandon(&open);
                return;
            }
        }
    }
}

/// Record one segment until silence, the hard cap, or a write error.
async fn record_segment(
    store: &SegmentStore,
    open: &OpenSegment,
    frames: &mut FrameStream,
    encoder: &dyn StreamEncoder,
    config: &CaptureConfig,
) -> SegmentEnd {
    let mut writer = match encoder.begin(&open.part_path) {
        Ok(writer) => writer,
        Err(e) => {
            error!("Failed to start encoder for {}: {:#}", open.key, e);
            return SegmentEnd::Failed;
        }
    };

    let deadline = tokio::time::sleep(config.segment_max);
    tokio::pin!(deadline);

    let mut frames_written = 0usize;

    let end = loop {
        tokio::select! {
            maybe_frame = frames.recv() => match maybe_frame {
                Some(frame) => {
                    if let Err(e) = writer.write_frame(&frame) {
                        error!("Error recording segment {}: {:#}", open.key, e);
                        break SegmentEnd::Failed;
                    }
                    frames_written += 1;
                }
                None => break SegmentEnd::Silence,
            },
            _ = &mut deadline => break SegmentEnd::HardTimeout,
        }
    };

    if matches!(end, SegmentEnd::Failed) {
        // Drop the writer before the caller deletes the partial file.
        drop(writer);
        return end;
    }

    if let Err(e) = writer.finish() {
        error!("Failed to finalize segment {}: {:#}", open.key, e);
        return SegmentEnd::Failed;
    }

    if frames_written == 0 {
        // Subscription ended before any audio arrived; nothing to keep.
        return end;
    }

    match store.promote(open) {
        Ok(_) => end,
        Err(e) => {
            error!("Failed to close segment {}: {:#}", open.key, e);
            SegmentEnd::Failed
        }
    }
}
