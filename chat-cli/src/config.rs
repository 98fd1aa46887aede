//! Configuration loading for chat-cli.
//!
//! Configuration is loaded from a TOML file (default: `config.toml` in the
//! platform config directory). Command-line flags override file values.

use chat_client::ChatConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration for chat-cli.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Connection configuration.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Server host including scheme (default: ws://localhost).
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port (default: 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// User to connect as.
    pub user_id: Option<String>,
    /// Access token (prompted for if missing).
    pub access_token: Option<String>,
    /// Reconnection attempts after a lost connection (default: unlimited).
    pub max_reconnect_attempts: Option<u32>,
    /// Timeout for opening the connection (default: 20).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset (default: info).
    #[serde(default = "default_filter")]
    pub filter: String,
}

// Default value functions
fn default_host() -> String {
    "ws://localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_connect_timeout_secs() -> u64 {
    20
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user_id: None,
            access_token: None,
            max_reconnect_attempts: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Connection values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--host`
    pub host: Option<String>,
    /// `--port`
    pub port: Option<u16>,
    /// `--user`
    pub user_id: Option<String>,
    /// `--token`
    pub access_token: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load the explicit file if given, otherwise the default file if it
    /// exists, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: Overrides) {
        let connection = &mut self.connection;
        if let Some(host) = overrides.host {
            connection.host = host;
        }
        if let Some(port) = overrides.port {
            connection.port = port;
        }
        if overrides.user_id.is_some() {
            connection.user_id = overrides.user_id;
        }
        if overrides.access_token.is_some() {
            connection.access_token = overrides.access_token;
        }
    }
}

impl ConnectionConfig {
    /// Build the client configuration with the given access token.
    ///
    /// # Errors
    ///
    /// Returns an error if no user id is configured.
    pub fn chat_config(&self, access_token: &str) -> Result<ChatConfig, ConfigError> {
        let user_id = self
            .user_id
            .as_deref()
            .ok_or(ConfigError::MissingField("user_id"))?;

        let config = ChatConfig::new(&self.host, self.port, user_id, access_token);
        Ok(match self.max_reconnect_attempts {
            Some(attempts) => config.with_max_reconnect_attempts(attempts),
            None => config,
        })
    }

    /// Connection timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Default config file location for chat-cli.
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "simple-chat", "chat-cli")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A required value was neither configured nor given as a flag.
    #[error("missing {0}: set it in the config file or pass it as a flag")]
    MissingField(&'static str),
}
