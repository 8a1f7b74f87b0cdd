use super::state::AppState;
use crate::nats::NatsFrameSource;
use crate::session::{RecordingSession, SessionConfig, SessionReport, SessionStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Destination channel identity for storage handoff
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub session_id: String,
    pub status: String,
    pub stats: SessionStats,
    pub report: SessionReport,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions/start
/// Start a new recording session
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    info!("Starting session: {}", session_id);

    // Check if already recording
    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Session {} is already recording", session_id),
                }),
            )
                .into_response();
        }
    }

    let source = match NatsFrameSource::connect(&state.deps.nats_url, session_id.clone()).await {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("Failed to connect frame source: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to connect frame source: {}", e),
                }),
            )
                .into_response();
        }
    };

    let config = SessionConfig {
        session_id: session_id.clone(),
        channel_id: req.channel_id,
    };

    let session = Arc::new(RecordingSession::new(
        config,
        Arc::clone(&state.deps.store),
        source,
        Arc::clone(&state.deps.encoder),
        state.deps.capture_config.clone(),
    ));

    if let Err(e) = session.start().await {
        error!("Failed to start session: {:#}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to start session: {}", e),
            }),
        )
            .into_response();
    }

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session);
    }

    info!("Session started: {}", session_id);

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "recording".to_string(),
            message: format!("Recording started for session {}", session_id),
        }),
    )
        .into_response()
}

/// POST /sessions/stop/:session_id
/// Stop a session, then run merge, transcription and handoff
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping session: {}", session_id);

    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    let Some(session) = session else {
        error!("Session {} not found", session_id);
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response();
    };

    let stats = match session.stop().await {
        Ok(stats) => stats,
        Err(e) => {
            error!("Failed to stop session: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to stop session: {}", e),
                }),
            )
                .into_response();
        }
    };

    let report = match state
        .deps
        .processor
        .process(&session_id, session.channel_id())
        .await
    {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to process session: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to process session: {}", e),
                }),
            )
                .into_response();
        }
    };

    info!("Session stopped and processed: {}", session_id);

    (
        StatusCode::OK,
        Json(StopSessionResponse {
            session_id,
            status: "stopped".to_string(),
            stats,
            report,
        }),
    )
        .into_response()
}

/// GET /sessions/:session_id/status
/// Get status of a recording session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => match session.stats().await {
            Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
            Err(e) => {
                error!("Failed to get stats: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("Failed to get stats: {}", e),
                    }),
                )
                    .into_response()
            }
        },
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
