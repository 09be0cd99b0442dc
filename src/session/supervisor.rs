//! Session Supervisor
//!
//! Keeps one monitor session to the node alive until shutdown:
//!
//! ```text
//! ┌─▶ connect (exponential backoff) ─▶ handshake ─▶ keepalive + monitor engine ─┐
//! └──────────────────────────── short pause ◀───────────────────────────────────┘
//! ```
//!
//! Every failure is logged and retried; only cancellation ends the loop.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::backoff::Backoff;
use super::error::SessionError;
use super::handshake::{pause, perform_handshake, HandshakeTimings};
use super::keepalive::run_keepalive;
use super::status::SessionStatus;
use crate::monitor::{HslRouteColor, MonitorArchive, MonitorEngine, MonitorError, RouteColor};
use crate::websocket::BroadcastHub;

/// Opens the byte stream to the node
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    async fn connect(&self) -> std::io::Result<Self::Stream>;

    /// Target description for logs
    fn target(&self) -> String;
}

/// Plain TCP to `host:port`
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> std::io::Result<TcpStream> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn target(&self) -> String {
        self.addr.clone()
    }
}

/// Supervisor settings
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Operator callsign sent as the login
    pub callsign: String,
    /// Number of node ports to monitor
    pub ports: u32,
    /// First connect retry delay of each cycle
    pub initial_backoff: Duration,
    /// Upper bound on the connect retry delay
    pub max_backoff: Duration,
    /// Keepalive period
    pub keepalive: Duration,
    pub handshake: HandshakeTimings,
    /// Pause before starting a new cycle
    pub retry_pause: Duration,
    /// Archive raw frames here when set
    pub archive_dir: Option<PathBuf>,
    pub console_echo: bool,
}

impl SupervisorConfig {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            ports: 12,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5 * 60),
            keepalive: Duration::from_secs(2 * 60),
            handshake: HandshakeTimings::default(),
            retry_pause: Duration::from_secs(1),
            archive_dir: None,
            console_echo: false,
        }
    }
}

/// Owns the node session lifecycle
pub struct SessionSupervisor<C> {
    connector: C,
    config: SupervisorConfig,
    hub: Arc<BroadcastHub>,
    colors: Arc<dyn RouteColor>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl<C: Connector> SessionSupervisor<C> {
    pub fn new(connector: C, config: SupervisorConfig, hub: Arc<BroadcastHub>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Disconnected);
        Self {
            connector,
            config,
            hub,
            colors: Arc::new(HslRouteColor),
            status: Arc::new(status),
        }
    }

    pub fn with_route_color(mut self, colors: Arc<dyn RouteColor>) -> Self {
        self.colors = colors;
        self
    }

    /// Watch the supervisor's progress
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Run sessions back to back until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(target_addr = %self.connector.target(), "Session supervisor started");

        while !cancel.is_cancelled() {
            match self.run_session(&cancel).await {
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    tracing::warn!(kind = ?e.kind(), error = %e, "Session ended, reconnecting");
                }
                Ok(()) => {}
            }
            self.status.send_replace(SessionStatus::Disconnected);

            if pause(self.config.retry_pause, &cancel).await.is_err() {
                break;
            }
        }

        self.status.send_replace(SessionStatus::Stopped);
        tracing::info!("Session supervisor stopped");
    }

    /// One connect → handshake → monitor cycle.
    async fn run_session(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        let stream = self.connect(cancel).await?;
        let (reader, mut writer) = tokio::io::split(stream);

        self.status.send_replace(SessionStatus::Handshaking);
        perform_handshake(
            &mut writer,
            &self.config.callsign,
            self.config.ports,
            self.config.handshake,
            cancel,
        )
        .await?;

        let mut engine = MonitorEngine::new(reader, Arc::clone(&self.hub))
            .with_route_color(Arc::clone(&self.colors))
            .with_console_echo(self.config.console_echo)
            .with_status(Arc::clone(&self.status));
        if let Some(dir) = &self.config.archive_dir {
            let archive = MonitorArchive::create(dir)
                .await
                .map_err(MonitorError::Archive)?;
            engine = engine.with_archive(archive);
        }

        let session = cancel.child_token();
        let keepalive = tokio::spawn(run_keepalive(
            writer,
            self.config.keepalive,
            session.clone(),
        ));

        let error = engine.run(&session).await;

        session.cancel();
        if let Err(e) = keepalive.await {
            tracing::warn!(error = %e, "Keepalive task failed");
        }

        Err(error.into())
    }

    /// Connect, retrying with a fresh backoff sequence.
    async fn connect(&self, cancel: &CancellationToken) -> Result<C::Stream, SessionError> {
        let mut backoff = Backoff::new(self.config.initial_backoff, self.config.max_backoff);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            self.status.send_replace(SessionStatus::Connecting(attempt));

            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
                result = self.connector.connect() => result,
            };

            match result {
                Ok(stream) => {
                    tracing::info!(target_addr = %self.connector.target(), attempt, "Connected to node");
                    return Ok(stream);
                }
                Err(source) => {
                    let delay = backoff.next_delay();
                    let error = SessionError::Connect {
                        addr: self.connector.target(),
                        source,
                    };
                    tracing::warn!(error = %error, retry_in = ?delay, attempt, "Connection failed");
                    pause(delay, cancel).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::HubConfig;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::time::Instant;

    /// Hands out scripted connect results and records when each attempt happened.
    struct ScriptedConnector {
        script: Mutex<VecDeque<std::io::Result<DuplexStream>>>,
        attempts: Arc<Mutex<Vec<Instant>>>,
    }

    impl ScriptedConnector {
        fn new(script: Vec<std::io::Result<DuplexStream>>) -> (Self, Arc<Mutex<Vec<Instant>>>) {
            let attempts = Arc::new(Mutex::new(Vec::new()));
            let connector = Self {
                script: Mutex::new(script.into()),
                attempts: Arc::clone(&attempts),
            };
            (connector, attempts)
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        type Stream = DuplexStream;

        async fn connect(&self) -> std::io::Result<DuplexStream> {
            self.attempts.lock().unwrap().push(Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(refused()))
        }

        fn target(&self) -> String {
            "scripted".to_string()
        }
    }

    fn refused() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused")
    }

    fn fast_config() -> SupervisorConfig {
        SupervisorConfig {
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
            handshake: HandshakeTimings {
                settle: Duration::from_millis(10),
                step: Duration::from_millis(10),
            },
            retry_pause: Duration::from_secs(1),
            ..SupervisorConfig::new("G4ABC")
        }
    }

    fn gaps(attempts: &[Instant]) -> Vec<u64> {
        attempts
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_to_cap() {
        let (connector, attempts) = ScriptedConnector::new(Vec::new());
        let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
        let supervisor = SessionSupervisor::new(connector, fast_config(), hub);
        let cancel = CancellationToken::new();

        let run = supervisor.run(cancel.clone());
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => panic!("supervisor exited before cancellation"),
            _ = tokio::time::sleep(Duration::from_secs(60)) => {}
        }
        cancel.cancel();
        run.await;

        let attempts = attempts.lock().unwrap();
        assert_eq!(&gaps(&attempts)[..6], &[1, 2, 4, 8, 8, 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_resets_after_connection() {
        let (node_side, client_side) = tokio::io::duplex(1024);
        drop(node_side);
        let script = vec![Err(refused()), Err(refused()), Err(refused()), Ok(client_side)];
        let (connector, attempts) = ScriptedConnector::new(script);
        let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
        let supervisor = SessionSupervisor::new(connector, fast_config(), hub);
        let cancel = CancellationToken::new();

        let run = supervisor.run(cancel.clone());
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => panic!("supervisor exited before cancellation"),
            _ = tokio::time::sleep(Duration::from_secs(20)) => {}
        }
        cancel.cancel();
        run.await;

        let attempts = attempts.lock().unwrap();
        let gaps = gaps(&attempts);
        // Three failures, a connection whose handshake fails, the retry
        // pause, then a new cycle starting from the initial delay.
        assert_eq!(&gaps[..3], &[1, 2, 4]);
        assert_eq!(gaps[3], 1);
        assert_eq!(gaps[4], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_session() {
        let (mut node, client) = tokio::io::duplex(64 * 1024);
        let (connector, _) = ScriptedConnector::new(vec![Ok(client)]);
        let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
        let mut subscription = hub.attach().await.unwrap();

        let supervisor = SessionSupervisor::new(connector, fast_config(), Arc::clone(&hub));
        let mut status = supervisor.status();
        let cancel = CancellationToken::new();
        let run = tokio::spawn({
            let cancel = cancel.clone();
            async move { supervisor.run(cancel).await }
        });

        node.write_all(b"Connected to TelnetServer\r\xff\xff1|1 VHF|")
            .await
            .unwrap();
        node.write_all(b"\xff\x1b\x11[16:34:33R TNC>USB Port=1 hello world\r\xfe")
            .await
            .unwrap();

        let message = subscription.receiver.recv().await.unwrap();
        let event: serde_json::Value = serde_json::from_str(&message).unwrap();
        assert_eq!(event["type"], "log");
        assert_eq!(event["route"], "TNC>USB");
        assert_eq!(event["message"], "hello world");
        assert!(status.borrow_and_update().is_streaming());

        let mut login = vec![0u8; 256];
        let n = node.read(&mut login).await.unwrap();
        let login = String::from_utf8_lossy(&login[..n]).to_string();
        assert!(login.starts_with("G4ABC\rp\rBPQTERMTCP\r"));

        tokio::time::sleep(Duration::from_secs(121)).await;
        let mut keepalive = [0xAAu8; 1];
        node.read_exact(&mut keepalive).await.unwrap();
        assert_eq!(keepalive, [0]);

        cancel.cancel();
        run.await.unwrap();
        assert_eq!(*status.borrow(), SessionStatus::Stopped);
    }

    #[tokio::test]
    async fn test_tcp_connector_reaches_node() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connector = TcpConnector::new("127.0.0.1", port);
        assert_eq!(connector.target(), format!("127.0.0.1:{}", port));

        let node = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"Connected to TelnetServer\r").await.unwrap();
        });

        let mut stream = connector.connect().await.unwrap();
        let mut banner = Vec::new();
        stream.read_to_end(&mut banner).await.unwrap();
        assert_eq!(banner, b"Connected to TelnetServer\r");
        node.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_connector_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(TcpConnector::new("127.0.0.1", port).connect().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_is_prompt() {
        let (connector, _) = ScriptedConnector::new(Vec::new());
        let config = SupervisorConfig {
            initial_backoff: Duration::from_secs(300),
            max_backoff: Duration::from_secs(300),
            ..fast_config()
        };
        let hub = Arc::new(BroadcastHub::new(HubConfig::default()));
        let supervisor = SessionSupervisor::new(connector, config, hub);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        let run = supervisor.run(cancel.clone());
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => panic!("supervisor exited before cancellation"),
            _ = tokio::time::sleep(Duration::from_secs(5)) => {}
        }
        cancel.cancel();
        run.await;

        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
