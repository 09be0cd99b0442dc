use serde::Serialize;

use crate::monitor::MonitorState;

/// Where the supervisor currently is in its connect/monitor cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session and no attempt in progress
    Disconnected,
    /// Connect attempt number `n` of the current cycle
    Connecting(u32),
    /// Sending the login and monitor commands
    Handshaking,
    /// The monitor engine owns the session
    Monitor(MonitorState),
    /// The supervisor has shut down
    Stopped,
}

impl SessionStatus {
    /// Whether monitor frames are currently flowing
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Monitor(MonitorState::Monitoring))
    }
}
