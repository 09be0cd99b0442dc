//! Dashboard HTTP surface
//!
//! Built with Axum.
//!
//! # Endpoints
//!
//! - `GET /ws` - Event stream (history replay, then live events)
//! - `GET /version` - Crate version
//! - `GET /health` - Session and hub status
//! - `GET /health/live` - Liveness probe
//!
//! # Example
//!
//! ```rust,ignore
//! use bpqmon::api::{serve, ApiConfig, AppState};
//! use bpqmon::websocket::{BroadcastHub, HubConfig};
//!
//! let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
//! let state = AppState::new(hub, supervisor.status(), ApiConfig::default());
//! serve(state, &ApiConfig::default(), cancel).await?;
//! ```

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/version", get(routes::health::version))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Bind the configured address and serve until `cancel` fires
pub async fn serve(
    state: AppState,
    config: &ApiConfig,
    cancel: CancellationToken,
) -> Result<(), ApiError> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Dashboard server listening on {}", addr);

    serve_on(listener, state, cancel).await
}

/// Serve on an already bound listener until `cancel` fires
pub async fn serve_on(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), ApiError> {
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Dashboard server shut down gracefully");
    Ok(())
}
