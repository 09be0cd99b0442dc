//! Node login and monitor-mode handshake
//!
//! After connecting, the node expects:
//!
//! 1. the operator callsign, CR terminated
//! 2. `p` and `BPQTERMTCP` to switch into the host-mode terminal
//! 3. a monitor command selecting which ports to monitor
//!
//! with pauses in between for the node to catch up.

use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use super::error::SessionError;

const MODE_SWITCH_COMMAND: &[u8] = b"p\r";
const TERMINAL_COMMAND: &[u8] = b"BPQTERMTCP\r";

/// Monitor flags following the port mask.
const MONITOR_SUFFIX: &str = "1 1 1 0 0 0 1";

/// Pauses between handshake writes
#[derive(Debug, Clone, Copy)]
pub struct HandshakeTimings {
    /// Before the first write and after the last one
    pub settle: Duration,
    /// Between the intermediate writes
    pub step: Duration,
}

impl Default for HandshakeTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            step: Duration::from_secs(1),
        }
    }
}

/// Handshake write that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeStep {
    Callsign,
    ModeSwitch,
    Terminal,
    MonitorPorts,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Callsign => "callsign",
            Self::ModeSwitch => "mode switch",
            Self::Terminal => "terminal command",
            Self::MonitorPorts => "monitor port mask",
        };
        f.write_str(name)
    }
}

/// Bitmask with one bit per monitored port, port 0 in the LSB.
pub fn port_mask(ports: u32) -> u64 {
    match ports {
        0 => 0,
        64..=u32::MAX => u64::MAX,
        n => (1u64 << n) - 1,
    }
}

/// The command enabling monitoring on the first `ports` ports.
pub fn monitor_command(ports: u32) -> String {
    format!(r"\\\\{:x} {}", port_mask(ports), MONITOR_SUFFIX)
}

/// Log in and switch the node into monitor mode.
pub async fn perform_handshake<W>(
    writer: &mut W,
    callsign: &str,
    ports: u32,
    timings: HandshakeTimings,
    cancel: &CancellationToken,
) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    pause(timings.settle, cancel).await?;

    send(writer, HandshakeStep::Callsign, format!("{callsign}\r").as_bytes()).await?;
    pause(timings.step, cancel).await?;

    send(writer, HandshakeStep::ModeSwitch, MODE_SWITCH_COMMAND).await?;
    send(writer, HandshakeStep::Terminal, TERMINAL_COMMAND).await?;
    pause(timings.step, cancel).await?;

    let command = format!("{}\r", monitor_command(ports));
    send(writer, HandshakeStep::MonitorPorts, command.as_bytes()).await?;
    pause(timings.settle, cancel).await?;

    tracing::debug!(ports, "Handshake complete");
    Ok(())
}

async fn send<W>(writer: &mut W, step: HandshakeStep, bytes: &[u8]) -> Result<(), SessionError>
where
    W: AsyncWrite + Unpin,
{
    let result = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    result.map_err(|source| SessionError::Handshake { step, source })
}

/// Sleep unless cancelled first.
pub(crate) async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), SessionError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(SessionError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
