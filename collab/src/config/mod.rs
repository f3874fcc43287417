//! Configuration system for the collab chat client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/collab/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use collab_proto::models::UserId;

use crate::net::NetConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    session: SessionFileConfig,
    ui: UiFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    base_url: Option<String>,
    ws_base_url: Option<String>,
    connect_timeout_secs: Option<u64>,
    channel_capacity: Option<usize>,
    notification_poll_secs: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    token: Option<String>,
    user_id: Option<UserId>,
    username: Option<String>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    typing_timeout_ms: Option<u64>,
    timestamp_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Server --
    /// REST base URL (e.g., `http://127.0.0.1:9000`).
    pub base_url: String,
    /// WebSocket base URL; chat sockets open at `{ws_base_url}/chat/{id}/`.
    pub ws_base_url: String,
    /// Timeout for opening a chat socket or a REST request.
    pub connect_timeout: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
    /// Interval between notification fetches.
    pub notification_poll: Duration,

    // -- Session --
    /// Bearer token issued by the marketplace.
    pub token: Option<String>,
    /// The session user's id.
    pub user_id: Option<UserId>,
    /// The session user's display name.
    pub username: Option<String>,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// Idle time after the last keystroke before typing-stop is sent.
    pub typing_timeout: Duration,
    /// Timestamp display format string (chrono).
    pub timestamp_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            ws_base_url: "ws://127.0.0.1:9000/ws".to_string(),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 256,
            notification_poll: Duration::from_secs(10),
            token: None,
            user_id: None,
            username: None,
            poll_timeout: Duration::from_millis(50),
            typing_timeout: Duration::from_millis(2000),
            timestamp_format: "%H:%M".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/collab/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. This is separated from `load()` to
    /// enable unit testing without CLI parsing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            base_url: cli
                .base_url
                .clone()
                .or_else(|| file.server.base_url.clone())
                .unwrap_or(defaults.base_url),
            ws_base_url: cli
                .ws_base_url
                .clone()
                .or_else(|| file.server.ws_base_url.clone())
                .unwrap_or(defaults.ws_base_url),
            connect_timeout: file
                .server
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            channel_capacity: file
                .server
                .channel_capacity
                .unwrap_or(defaults.channel_capacity),
            notification_poll: file
                .server
                .notification_poll_secs
                .map_or(defaults.notification_poll, Duration::from_secs),
            token: cli.token.clone().or_else(|| file.session.token.clone()),
            user_id: cli.user_id.or(file.session.user_id),
            username: cli
                .username
                .clone()
                .or_else(|| file.session.username.clone()),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            typing_timeout: file
                .ui
                .typing_timeout_ms
                .map_or(defaults.typing_timeout, Duration::from_millis),
            timestamp_format: cli
                .timestamp_format
                .clone()
                .or_else(|| file.ui.timestamp_format.clone())
                .unwrap_or(defaults.timestamp_format),
        }
    }

    /// Build a [`NetConfig`] from this configuration, if a session is
    /// configured.
    ///
    /// Returns `None` if `token` or `user_id` is missing or the token is
    /// blank (signed-out mode).
    #[must_use]
    pub fn to_net_config(&self) -> Option<NetConfig> {
        let token = self.token.clone()?;
        let user_id = self.user_id?;

        if token.trim().is_empty() {
            return None;
        }

        Some(NetConfig {
            base_url: self.base_url.clone(),
            ws_base_url: self.ws_base_url.clone(),
            token,
            user_id,
            connect_timeout: self.connect_timeout,
            channel_capacity: self.channel_capacity,
            notification_poll: self.notification_poll,
        })
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Terminal chat for the collab marketplace")]
pub struct CliArgs {
    /// REST base URL of the chat server.
    #[arg(long, env = "COLLAB_BASE_URL")]
    pub base_url: Option<String>,

    /// WebSocket base URL of the chat server.
    #[arg(long, env = "COLLAB_WS_URL")]
    pub ws_base_url: Option<String>,

    /// Bearer token for the session user.
    #[arg(long, env = "COLLAB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// The session user's id.
    #[arg(long, env = "COLLAB_USER_ID")]
    pub user_id: Option<UserId>,

    /// The session user's display name.
    #[arg(long, env = "COLLAB_USERNAME")]
    pub username: Option<String>,

    /// Path to config file (default: `~/.config/collab/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "COLLAB_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/collab.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("collab").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
