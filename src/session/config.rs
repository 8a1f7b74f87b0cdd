use serde::{Deserialize, Serialize};

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (typically the server/group the voice
    /// session belongs to)
    pub session_id: String,

    /// Destination channel identity, used in storage handoff keys
    pub channel_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            channel_id: "general".to_string(),
        }
    }
}
