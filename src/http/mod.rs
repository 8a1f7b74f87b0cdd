//! HTTP API server for external control
//!
//! This module provides a REST API for controlling recording sessions:
//! - POST /sessions/start - Start a new recording session
//! - POST /sessions/stop/:id - Stop a session and run processing
//! - GET /sessions/:id/status - Query session status
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, SessionDeps};
