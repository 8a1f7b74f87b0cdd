use crate::capture::{CaptureConfig, StreamEncoder};
use crate::session::{RecordingSession, SessionProcessor};
use crate::store::SegmentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything a handler needs to build and process sessions
pub struct SessionDeps {
    pub store: Arc<SegmentStore>,
    pub encoder: Arc<dyn StreamEncoder>,
    pub processor: Arc<SessionProcessor>,
    pub capture_config: CaptureConfig,
    pub nats_url: String,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active recording sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<RecordingSession>>>>,

    /// Shared pipeline dependencies
    pub deps: Arc<SessionDeps>,
}

impl AppState {
    pub fn new(deps: Arc<SessionDeps>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            deps,
        }
    }
}
