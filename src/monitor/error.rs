//! Monitor stream error types

use thiserror::Error;

use super::engine::MonitorState;

/// Reasons a monitor session ended
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Reading from the node failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The node closed the stream
    #[error("Stream closed while {state:?}")]
    Closed { state: MonitorState },

    /// The node sent framing we don't understand
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Writing the monitor archive failed
    #[error("Archive error: {0}")]
    Archive(std::io::Error),

    /// Shutdown was requested
    #[error("Cancelled")]
    Cancelled,
}
