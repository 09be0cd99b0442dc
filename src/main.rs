//! bpqmon
//!
//! Connects to the node, streams its monitor output and serves dashboards.
//!
//! # Configuration
//!
//! Settings come from a TOML file (see `--print-config`), then `BPQMON_*`
//! environment variables, then the flags below. `RUST_LOG` overrides the
//! configured log level.

use anyhow::Context;
use bpqmon::api::{self, AppState};
use bpqmon::config::{generate_default_config, Config};
use bpqmon::identity;
use bpqmon::session::{SessionSupervisor, TcpConnector};
use bpqmon::websocket::BroadcastHub;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bpqmon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live monitor feed from a packet radio node")]
struct Cli {
    /// Config file (default: searched in the usual locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Callsign used to log in to the node
    #[arg(long)]
    call: Option<String>,

    /// Node hostname
    #[arg(long)]
    host: Option<String>,

    /// Number of ports to monitor
    #[arg(long)]
    ports: Option<u32>,

    /// Number of events kept for dashboard replay
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Print monitor lines to the console
    #[arg(long)]
    console_out: bool,

    /// Archive raw monitor frames to log_<unix>.txt
    #[arg(long)]
    file_log: bool,

    /// Log raw protocol traffic
    #[arg(long)]
    debug_info: bool,

    /// Dashboard listen address
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(call) = &self.call {
            config.node.callsign = Some(call.clone());
        }
        if let Some(host) = &self.host {
            config.node.host = host.clone();
        }
        if let Some(ports) = self.ports {
            config.node.ports = ports;
        }
        if let Some(size) = self.buffer_size {
            config.history.capacity = size;
        }
        if self.console_out {
            config.output.console_echo = true;
        }
        if self.file_log {
            config.output.file_logging = true;
        }
        if self.debug_info {
            config.logging.level = "trace".to_string();
        }
        if let Some(addr) = self.listen {
            config.api.host = addr.ip().to_string();
            config.api.port = addr.port();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    cli.apply(&mut config);

    init_tracing(&config.logging.level, &config.logging.format);
    tracing::info!("Starting bpqmon v{}", env!("CARGO_PKG_VERSION"));

    if config.node.callsign.is_none() {
        config.node.callsign = identity::discover_callsign();
    }
    config.validate()?;

    let hub = Arc::new(BroadcastHub::new(config.hub_config()));
    let supervisor = SessionSupervisor::new(
        TcpConnector::new(&config.node.host, config.node.port),
        config.supervisor_config()?,
        Arc::clone(&hub),
    );
    let state = AppState::new(Arc::clone(&hub), supervisor.status(), config.api.clone());

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let session = {
        let cancel = cancel.clone();
        tokio::spawn(async move { supervisor.run(cancel).await })
    };

    let served = api::serve(state, &config.api, cancel.clone()).await;
    cancel.cancel();
    session.await.context("session task panicked")?;

    served?;
    tracing::info!("bpqmon stopped");
    Ok(())
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bpqmon={level},tower_http={level}").into());

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Cancel `cancel` on Ctrl+C or SIGTERM
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel.cancelled() => return,
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
    cancel.cancel();
}
