//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::session::SessionStatus;
use crate::websocket::BroadcastHub;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Event hub dashboards attach to
    pub hub: Arc<BroadcastHub>,
    /// Current node session status
    pub status: watch::Receiver<SessionStatus>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        hub: Arc<BroadcastHub>,
        status: watch::Receiver<SessionStatus>,
        config: ApiConfig,
    ) -> Self {
        Self {
            hub,
            status,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Snapshot of the session status
    pub fn session_status(&self) -> SessionStatus {
        *self.status.borrow()
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8212
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
