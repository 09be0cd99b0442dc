//! Session error types
//!
//! None of these are fatal to the process: the supervisor logs them and
//! starts a new session.

use thiserror::Error;

use super::handshake::HandshakeStep;
use crate::monitor::MonitorError;

/// Why a session cycle ended
#[derive(Error, Debug)]
pub enum SessionError {
    /// Could not reach the node
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A handshake write failed
    #[error("Handshake failed at {step}: {source}")]
    Handshake {
        step: HandshakeStep,
        #[source]
        source: std::io::Error,
    },

    /// The monitor stream ended
    #[error("Monitor stream ended: {0}")]
    Monitor(#[from] MonitorError),

    /// Shutdown was requested
    #[error("Cancelled")]
    Cancelled,
}

/// Coarse classification used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConnectFailure,
    HandshakeFailure,
    ProtocolViolation,
    StreamFailure,
    Cancelled,
}

impl SessionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Connect { .. } => FailureKind::ConnectFailure,
            Self::Handshake { .. } => FailureKind::HandshakeFailure,
            Self::Monitor(MonitorError::ProtocolViolation(_)) => FailureKind::ProtocolViolation,
            Self::Monitor(MonitorError::Cancelled) | Self::Cancelled => FailureKind::Cancelled,
            Self::Monitor(_) => FailureKind::StreamFailure,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == FailureKind::Cancelled
    }
}
