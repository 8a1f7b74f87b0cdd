use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::capture::{CaptureConfig, CaptureManager, StreamEncoder, VoiceFrameSource};
use crate::store::SegmentStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// A live recording session: routes speaking events to per-speaker captures.
///
/// The session never touches segments after they close; the post-capture
/// pipeline belongs to [`super::SessionProcessor`].
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    /// Per-speaker capture lifecycle
    manager: Arc<CaptureManager>,

    /// Transport delivering frames and speaking events
    source: Arc<dyn VoiceFrameSource>,

    /// Store, for stats listings
    store: Arc<SegmentStore>,

    /// When the session started
    started_at: chrono::DateTime<chrono::Utc>,

    /// Whether capture is currently active
    is_recording: Arc<AtomicBool>,

    /// Handle for the speaking-event routing task
    event_task_handle: Mutex<Option<JoinHandle<()>>>,

    /// Signals the routing task to stop promptly
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        store: Arc<SegmentStore>,
        source: Arc<dyn VoiceFrameSource>,
        encoder: Arc<dyn StreamEncoder>,
        capture_config: CaptureConfig,
    ) -> Self {
        let manager = Arc::new(CaptureManager::new(
            config.session_id.clone(),
            Arc::clone(&store),
            Arc::clone(&source),
            encoder,
            capture_config,
        ));

        Self {
            config,
            manager,
            source,
            store,
            started_at: Utc::now(),
            is_recording: Arc::new(AtomicBool::new(false)),
            event_task_handle: Mutex::new(None),
            stop_tx: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn channel_id(&self) -> &str {
        &self.config.channel_id
    }

    /// Start routing speaking events into captures.
    pub async fn start(&self) -> Result<()> {
        if self.is_recording.swap(true, Ordering::SeqCst) {
            warn!("Session {} already recording", self.config.session_id);
            return Ok(());
        }

        info!("Starting session {}", self.config.session_id);

        let mut events = self
            .source
            .speaking_events()
            .await
            .context("Failed to subscribe to speaking events")?;

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let manager = Arc::clone(&self.manager);
        let session_id = self.config.session_id.clone();

        let event_task = tokio::spawn(async move {
            info!("Speaking-event routing started for {}", session_id);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    maybe_event = events.recv() => match maybe_event {
                        Some(event) => {
                            // Stop events need no action: the transport's
                            // silence window ends the speaker's stream.
                            if event.started {
                                manager.begin_capture(&event.speaker_id).await;
                            }
                        }
                        None => {
                            warn!("Speaking-event stream for {} closed", session_id);
                            break;
                        }
                    },
                }
            }

            info!("Speaking-event routing stopped for {}", session_id);
        });

        *self.event_task_handle.lock().await = Some(event_task);
        *self.stop_tx.lock().await = Some(stop_tx);

        Ok(())
    }

    /// Stop the session: no new captures, in-flight segments finish on their
    /// own timeouts.
    pub async fn stop(&self) -> Result<SessionStats> {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            warn!("Session {} not recording", self.config.session_id);
            return self.stats().await;
        }

        info!("Stopping session {}", self.config.session_id);

        if let Some(stop_tx) = self.stop_tx.lock().await.take() {
            let _ = stop_tx.send(());
        }

        if let Some(task) = self.event_task_handle.lock().await.take() {
            if let Err(e) = task.await {
                error!("Event routing task panicked: {}", e);
            }
        }

        // Let open segments run out their silence/hard-cap timers.
        self.manager.wait_idle().await;

        info!("Session {} stopped", self.config.session_id);

        self.stats().await
    }

    /// Current session statistics
    pub async fn stats(&self) -> Result<SessionStats> {
        let duration = Utc::now().signed_duration_since(self.started_at);

        let segments_closed = self
            .store
            .list_closed(&self.config.session_id)
            .map(|segments| segments.len())
            .unwrap_or(0);

        Ok(SessionStats {
            is_recording: self.is_recording.load(Ordering::SeqCst),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            active_speakers: self.manager.active_count().await,
            segments_closed,
        })
    }
}
