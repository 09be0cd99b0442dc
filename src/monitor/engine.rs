//! Monitor Stream Engine
//!
//! Drives one node session from the telnet banner through the port list
//! into monitor mode, turning the byte stream into dashboard events.
//!
//! ```text
//! Connecting ──banner──▶ AwaitingPortList ──P descriptors──▶ Monitoring
//!      │                        │                                │
//!      └──────── read error / protocol violation ────────────────┴──▶ Failed
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::archive::MonitorArchive;
use super::color::{HslRouteColor, RouteColor};
use super::error::MonitorError;
use super::events::FrameEvents;
use super::frame::{
    clean_frame, is_banner, parse_port_list_header, port_descriptor, FRAME_TERMINATOR,
    HANDSHAKE_DELIMITER, MAX_CHUNK_LEN, PORT_LIST_DELIMITER,
};
use crate::session::SessionStatus;
use crate::websocket::BroadcastHub;

/// Position of the engine in the monitor protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// Waiting for the telnet banner
    Connecting,
    /// Reading the port list header and descriptors
    AwaitingPortList,
    /// Streaming monitor frames
    Monitoring,
    /// Terminal for this session
    Failed,
}

/// Turns one node session's byte stream into published events
pub struct MonitorEngine<R> {
    reader: BufReader<R>,
    state: MonitorState,
    hub: Arc<BroadcastHub>,
    colors: Arc<dyn RouteColor>,
    archive: Option<MonitorArchive>,
    console_echo: bool,
    ports: Vec<String>,
    status: Option<Arc<watch::Sender<SessionStatus>>>,
}

impl<R: AsyncRead + Unpin> MonitorEngine<R> {
    /// Create an engine reading from an established session
    pub fn new(reader: R, hub: Arc<BroadcastHub>) -> Self {
        Self {
            reader: BufReader::new(reader),
            state: MonitorState::Connecting,
            hub,
            colors: Arc::new(HslRouteColor),
            archive: None,
            console_echo: false,
            ports: Vec::new(),
            status: None,
        }
    }

    pub fn with_route_color(mut self, colors: Arc<dyn RouteColor>) -> Self {
        self.colors = colors;
        self
    }

    /// Archive every raw monitor frame
    pub fn with_archive(mut self, archive: MonitorArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Echo cleaned monitor text to stdout
    pub fn with_console_echo(mut self, enabled: bool) -> Self {
        self.console_echo = enabled;
        self
    }

    /// Report state transitions on a status channel
    pub fn with_status(mut self, status: Arc<watch::Sender<SessionStatus>>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Port descriptors announced by the node
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// Run until the stream fails or `cancel` fires.
    ///
    /// There is no successful exit: the returned error is why the session
    /// ended, and the engine is left in [`MonitorState::Failed`].
    pub async fn run(&mut self, cancel: &CancellationToken) -> MonitorError {
        self.transition(MonitorState::Connecting);

        let error = loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(MonitorError::Cancelled),
                result = self.step() => result,
            };
            if let Err(e) = step {
                break e;
            }
        };

        if let Some(archive) = self.archive.as_mut() {
            if let Err(e) = archive.flush().await {
                tracing::warn!(error = %e, "Failed to flush monitor archive");
            }
        }

        tracing::debug!(state = ?self.state, error = %error, "Monitor engine stopped");
        self.transition(MonitorState::Failed);
        error
    }

    async fn step(&mut self) -> Result<(), MonitorError> {
        match self.state {
            MonitorState::Connecting => {
                let chunk = self.read_chunk(HANDSHAKE_DELIMITER).await?;
                if is_banner(&chunk) {
                    tracing::info!("Node banner received");
                    self.transition(MonitorState::AwaitingPortList);
                } else {
                    tracing::trace!(text = %String::from_utf8_lossy(&chunk), "Pre-banner output");
                }
            }
            MonitorState::AwaitingPortList => {
                let header = self.read_chunk(PORT_LIST_DELIMITER).await?;
                let count = parse_port_list_header(&header)?;

                self.ports.clear();
                for port in 0..count {
                    let chunk = self.read_chunk(PORT_LIST_DELIMITER).await?;
                    let descriptor = port_descriptor(&chunk);
                    tracing::info!(port, descriptor = %descriptor, "Node port");
                    self.ports.push(descriptor);
                }

                self.transition(MonitorState::Monitoring);
            }
            MonitorState::Monitoring => {
                let frame = self.read_chunk(FRAME_TERMINATOR).await?;
                self.handle_frame(&frame).await?;
            }
            MonitorState::Failed => return Err(MonitorError::Closed { state: self.state }),
        }
        Ok(())
    }

    /// Read up to and including `delimiter`, at most [`MAX_CHUNK_LEN`] bytes.
    async fn read_chunk(&mut self, delimiter: u8) -> Result<Vec<u8>, MonitorError> {
        let mut chunk = Vec::new();
        (&mut self.reader)
            .take(MAX_CHUNK_LEN as u64)
            .read_until(delimiter, &mut chunk)
            .await?;

        if chunk.last() == Some(&delimiter) {
            Ok(chunk)
        } else if chunk.len() >= MAX_CHUNK_LEN {
            Err(MonitorError::ProtocolViolation(format!(
                "no {:#04x} delimiter within {} bytes while {:?}",
                delimiter, MAX_CHUNK_LEN, self.state
            )))
        } else {
            Err(MonitorError::Closed { state: self.state })
        }
    }

    async fn handle_frame(&mut self, raw: &[u8]) -> Result<(), MonitorError> {
        if let Some(archive) = self.archive.as_mut() {
            archive.append(raw).await.map_err(MonitorError::Archive)?;
        }

        let text = clean_frame(raw);
        tracing::trace!(bytes = raw.len(), "Monitor frame");

        for event in FrameEvents::interpret(&text, self.colors.as_ref()).into_events() {
            self.hub.publish_event(&event).await;
        }

        if self.console_echo {
            println!("{}", text);
        }
        Ok(())
    }

    fn transition(&mut self, next: MonitorState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "Monitor state change");
        }
        self.state = next;
        if let Some(status) = &self.status {
            status.send_replace(SessionStatus::Monitor(next));
        }
    }
}
