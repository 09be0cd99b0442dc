//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `BPQMON_*` environment overrides; command
//! line flags are applied on top by the binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiConfig;
use crate::session::{HandshakeTimings, SupervisorConfig};
use crate::websocket::HubConfig;

/// Highest port count the monitor mask command accepts
pub const MAX_PORTS: u32 = 63;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Node connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_node_host")]
    pub host: String,

    #[serde(default = "default_node_port")]
    pub port: u16,

    /// Operator callsign. Discovered from `~/node.ini` when unset.
    pub callsign: Option<String>,

    /// Number of node ports to monitor
    #[serde(default = "default_ports")]
    pub ports: u32,
}

fn default_node_host() -> String {
    "localhost".to_string()
}

fn default_node_port() -> u16 {
    8011
}

fn default_ports() -> u32 {
    12
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_node_host(),
            port: default_node_port(),
            callsign: None,
            ports: default_ports(),
        }
    }
}

/// Reconnect and handshake timing
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,

    #[serde(default = "default_settle")]
    pub settle_ms: u64,

    #[serde(default = "default_step")]
    pub step_ms: u64,

    #[serde(default = "default_retry_pause")]
    pub retry_pause_ms: u64,
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    300 // 5 minutes
}

fn default_keepalive() -> u64 {
    120
}

fn default_settle() -> u64 {
    3000
}

fn default_step() -> u64 {
    1000
}

fn default_retry_pause() -> u64 {
    1000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            keepalive_secs: default_keepalive(),
            settle_ms: default_settle(),
            step_ms: default_step(),
            retry_pause_ms: default_retry_pause(),
        }
    }
}

/// Event history and subscriber limits
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    #[serde(default = "default_subscriber_queue")]
    pub subscriber_queue: usize,

    #[serde(default = "default_max_subscribers")]
    pub max_subscribers: usize,
}

fn default_capacity() -> usize {
    5000
}

fn default_subscriber_queue() -> usize {
    1024
}

fn default_max_subscribers() -> usize {
    256
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            subscriber_queue: default_subscriber_queue(),
            max_subscribers: default_max_subscribers(),
        }
    }
}

/// Local copies of the monitor stream
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Archive raw frames to `log_<unix>.txt`
    #[serde(default)]
    pub file_logging: bool,

    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Print frames to stdout
    #[serde(default)]
    pub console_echo: bool,
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_logging: false,
            archive_dir: default_archive_dir(),
            console_echo: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in default_config_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply `BPQMON_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable numbers are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Node overrides
        if let Some(host) = lookup("BPQMON_NODE_HOST") {
            self.node.host = host;
        }
        if let Some(port) = lookup("BPQMON_NODE_PORT").and_then(|s| s.parse().ok()) {
            self.node.port = port;
        }
        if let Some(callsign) = lookup("BPQMON_CALLSIGN") {
            self.node.callsign = Some(callsign);
        }
        if let Some(ports) = lookup("BPQMON_PORTS").and_then(|s| s.parse().ok()) {
            self.node.ports = ports;
        }

        // History overrides
        if let Some(capacity) = lookup("BPQMON_BUFFER_SIZE").and_then(|s| s.parse().ok()) {
            self.history.capacity = capacity;
        }

        // Output overrides
        if let Some(flag) = lookup("BPQMON_FILE_LOG") {
            self.output.file_logging = parse_flag(&flag);
        }
        if let Some(dir) = lookup("BPQMON_ARCHIVE_DIR") {
            self.output.archive_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("BPQMON_CONSOLE_OUT") {
            self.output.console_echo = parse_flag(&flag);
        }

        // API overrides
        if let Some(host) = lookup("BPQMON_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("BPQMON_API_PORT").and_then(|s| s.parse().ok()) {
            self.api.port = port;
        }

        // Logging overrides
        if let Some(level) = lookup("BPQMON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("BPQMON_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject settings the session can't run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.host.trim().is_empty() {
            return Err(ConfigError::Invalid("node host is empty".to_string()));
        }
        if !(1..=MAX_PORTS).contains(&self.node.ports) {
            return Err(ConfigError::Invalid(format!(
                "ports must be between 1 and {}, got {}",
                MAX_PORTS, self.node.ports
            )));
        }
        match self.node.callsign.as_deref().map(str::trim) {
            Some(call) if !call.is_empty() => {}
            _ => {
                return Err(ConfigError::Invalid(
                    "no callsign configured and none found in node.ini".to_string(),
                ))
            }
        }
        let session = &self.session;
        if session.initial_backoff_ms == 0 {
            return Err(ConfigError::Invalid(
                "initial_backoff_ms must be at least 1".to_string(),
            ));
        }
        if session.max_backoff_secs == 0 {
            return Err(ConfigError::Invalid(
                "max_backoff_secs must be at least 1".to_string(),
            ));
        }
        if session.keepalive_secs == 0 {
            return Err(ConfigError::Invalid(
                "keepalive_secs must be at least 1".to_string(),
            ));
        }
        if self.history.max_subscribers == 0 {
            return Err(ConfigError::Invalid(
                "max_subscribers must be at least 1".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Invalid(format!(
                "unknown log format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Broadcast hub settings
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            history_capacity: self.history.capacity,
            subscriber_queue: self.history.subscriber_queue,
            max_subscribers: self.history.max_subscribers,
        }
    }

    /// Session supervisor settings. Requires a callsign.
    pub fn supervisor_config(&self) -> Result<SupervisorConfig, ConfigError> {
        let callsign = self
            .node
            .callsign
            .as_deref()
            .map(str::trim)
            .filter(|call| !call.is_empty())
            .ok_or_else(|| ConfigError::Invalid("callsign is required".to_string()))?;

        let session = &self.session;
        Ok(SupervisorConfig {
            callsign: callsign.to_string(),
            ports: self.node.ports,
            initial_backoff: Duration::from_millis(session.initial_backoff_ms),
            max_backoff: Duration::from_secs(session.max_backoff_secs),
            keepalive: Duration::from_secs(session.keepalive_secs),
            handshake: HandshakeTimings {
                settle: Duration::from_millis(session.settle_ms),
                step: Duration::from_millis(session.step_ms),
            },
            retry_pause: Duration::from_millis(session.retry_pause_ms),
            archive_dir: self
                .output
                .file_logging
                .then(|| self.output.archive_dir.clone()),
            console_echo: self.output.console_echo,
        })
    }
}

/// Config file search order
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("bpqmon").join("config.toml"));
    }
    paths.push(PathBuf::from("/etc/bpqmon/config.toml"));
    paths.push(PathBuf::from("./bpqmon.toml"));
    paths
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "no" | "off")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# bpqmon Configuration
#
# Environment variables override these settings:
# - BPQMON_NODE_HOST, BPQMON_NODE_PORT, BPQMON_CALLSIGN, BPQMON_PORTS
# - BPQMON_BUFFER_SIZE
# - BPQMON_FILE_LOG, BPQMON_ARCHIVE_DIR, BPQMON_CONSOLE_OUT
# - BPQMON_API_HOST, BPQMON_API_PORT
# - BPQMON_LOG_LEVEL, BPQMON_LOG_FORMAT

[node]
# Node telnet host and port
host = "localhost"
port = 8011

# Operator callsign used to log in. When unset, read from
# local-op-callsign in ~/node.ini
# callsign = "N0CALL"

# Number of node ports to monitor (1-63)
ports = 12

[session]
# Connect retry delay, doubling up to max_backoff_secs
initial_backoff_ms = 1000
max_backoff_secs = 300

# Idle keepalive period
keepalive_secs = 120

# Handshake pauses
settle_ms = 3000
step_ms = 1000

# Pause before reconnecting after a session ends
retry_pause_ms = 1000

[history]
# Events replayed to newly connected dashboards
capacity = 5000

# Live events a dashboard may fall behind before it is dropped
subscriber_queue = 1024

max_subscribers = 256

[output]
# Append raw monitor frames to log_<unix>.txt
file_logging = false
archive_dir = "."

# Print monitor text to stdout
console_echo = false

[api]
# Dashboard server host and port
host = "0.0.0.0"
port = 8212

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
