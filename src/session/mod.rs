//! Node Session
//!
//! Connection lifecycle for the single upstream node session.
//!
//! - **supervisor**: connect/handshake/monitor loop under one cancellation token
//! - **backoff**: per-cycle exponential connect backoff
//! - **handshake**: login and monitor-mode command sequence
//! - **keepalive**: periodic NUL writes while a session is up
//! - **status**: observable supervisor state

mod backoff;
mod error;
mod handshake;
mod keepalive;
mod status;
mod supervisor;

pub use backoff::Backoff;
pub use error::{FailureKind, SessionError};
pub use handshake::{monitor_command, perform_handshake, port_mask, HandshakeStep, HandshakeTimings};
pub use keepalive::run_keepalive;
pub use status::SessionStatus;
pub use supervisor::{Connector, SessionSupervisor, SupervisorConfig, TcpConnector};
