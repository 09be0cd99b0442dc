//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Session and hub status
//! - GET /version - Crate version as plain text

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::api::state::AppState;
use crate::session::SessionStatus;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `streaming` while monitor frames are flowing, else `degraded`
    pub status: String,
    pub session: SessionStatus,
    pub subscribers: usize,
    pub history_len: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Always 200; a node outage is reported in the body, not as a failure
/// of this process.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let session = state.session_status();
    let status = if session.is_streaming() {
        "streaming"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        session,
        subscribers: state.hub.subscriber_count().await,
        history_len: state.hub.history_len().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /version
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_version() {
        assert_eq!(version().await, env!("CARGO_PKG_VERSION"));
    }
}
