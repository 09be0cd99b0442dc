//! # bpqmon
//!
//! Live monitor feed for a BPQ-style packet radio node: connects to the
//! node's telnet port, switches it into monitor mode and streams every
//! decoded frame to browser dashboards.
//!
//! ## Features
//!
//! - **Monitor stream**: banner, port list and framed monitor traffic
//!   decoded into log lines, raw text and TNC telemetry
//! - **Resilient session**: exponential reconnect backoff, keepalive and
//!   a single cancellation path for shutdown
//! - **Dashboards**: WebSocket fan-out with history replay for late joiners
//!
//! ## Modules
//!
//! - [`telemetry`]: TNC telemetry beacon decoder
//! - [`monitor`]: Monitor stream state machine and event model
//! - [`session`]: Connection lifecycle, handshake and keepalive
//! - [`websocket`]: Broadcast hub and WebSocket handler
//! - [`history`]: Bounded event history
//! - [`api`]: HTTP server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bpqmon::{BroadcastHub, HubConfig, SessionSupervisor, SupervisorConfig, TcpConnector};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
//!     let supervisor = SessionSupervisor::new(
//!         TcpConnector::new("localhost", 8011),
//!         SupervisorConfig::new("N0CALL"),
//!         Arc::clone(&hub),
//!     );
//!
//!     let cancel = CancellationToken::new();
//!     supervisor.run(cancel).await;
//! }
//! ```

pub mod api;
pub mod config;
pub mod history;
pub mod identity;
pub mod monitor;
pub mod session;
pub mod telemetry;
pub mod websocket;

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};

pub use history::HistoryBuffer;

pub use monitor::{MonitorEngine, MonitorError, MonitorEvent, MonitorState, RouteColor};

pub use session::{
    Connector, FailureKind, SessionError, SessionStatus, SessionSupervisor, SupervisorConfig,
    TcpConnector,
};

pub use telemetry::{decode_telemetry, TelemetryError, TelemetryRecord};

pub use websocket::{websocket_handler, BroadcastHub, HubConfig, HubError, Subscription};
