//! Configuration system for the collab relay server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/collab-relay/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;

use collab_proto::models::UserId;

/// Secret used when none is configured. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Errors that can occur when loading relay configuration.
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

    /// Two roster entries share an id.
    #[error("duplicate user id {0} in roster")]
    DuplicateUser(UserId),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the relay.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct RelayConfigFile {
    server: ServerFileConfig,
    users: Vec<UserEntry>,
}

/// `[server]` section of the relay config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    jwt_secret: Option<String>,
    max_message_len: Option<usize>,
    max_notifications: Option<usize>,
}

/// One `[[users]]` roster entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UserEntry {
    /// User id, as carried in tokens.
    pub id: UserId,
    /// Display name.
    pub username: String,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the relay server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Collab chat relay server")]
pub struct RelayCliArgs {
    /// Address to bind the relay server to.
    #[arg(short, long, env = "RELAY_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/collab-relay/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HS256 secret shared with the marketplace backend.
    #[arg(long, env = "COLLAB_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Maximum chat message length in bytes.
    #[arg(long)]
    pub max_message_len: Option<usize>,

    /// Maximum notifications kept per user.
    #[arg(long)]
    pub max_notifications: Option<usize>,

    /// Print a development token for this user id and exit.
    #[arg(long, value_name = "USER_ID")]
    pub issue_token: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "RELAY_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved relay server configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind the server to (e.g., `0.0.0.0:9000`).
    pub bind_addr: String,
    /// Token signing secret.
    pub jwt_secret: String,
    /// Maximum accepted chat message length in bytes.
    pub max_message_len: usize,
    /// Maximum notifications kept per user.
    pub max_notifications: usize,
    /// Known users.
    pub users: Vec<UserEntry>,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9000".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            max_message_len: 4096,
            max_notifications: 200,
            users: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl RelayConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or the roster repeats an id.
    pub fn load(cli: &RelayCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, file);
        config.validate()?;
        Ok(config)
    }

    /// Resolve a `RelayConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &RelayCliArgs, file: RelayConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            jwt_secret: cli
                .jwt_secret
                .clone()
                .or(file.server.jwt_secret)
                .unwrap_or(defaults.jwt_secret),
            max_message_len: cli
                .max_message_len
                .or(file.server.max_message_len)
                .unwrap_or(defaults.max_message_len),
            max_notifications: cli
                .max_notifications
                .or(file.server.max_notifications)
                .unwrap_or(defaults.max_notifications),
            users: file.users,
            log_level: cli.log_level.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if !seen.insert(user.id) {
                return Err(ConfigError::DuplicateUser(user.id));
            }
        }
        Ok(())
    }

    /// Whether the compiled-in development secret is in use.
    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the relay.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<RelayConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(RelayConfigFile::default());
        };
        config_dir.join("collab-relay").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RelayConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
