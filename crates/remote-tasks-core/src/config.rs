//! Client configuration.
//!
//! The on-disk format is a flat JSON object. Every field is optional; absent
//! fields take the defaults below.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default controller host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default controller port.
pub const DEFAULT_PORT: u16 = 9999;
/// Default maximum bytes per read.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
/// Default separator between result text and working directory.
pub const DEFAULT_SEPARATOR: &str = "<sep>";
/// Default token that ends the session.
pub const DEFAULT_EXIT_TOKEN: &str = "exit";
/// Default token that requests a project snapshot.
pub const DEFAULT_INFO_TOKEN: &str = "collect_info";
/// Default number of consecutive failed reads tolerated.
pub const DEFAULT_MAX_RECEIVE_FAILURES: u32 = 5;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Controller host name or address.
    #[serde(rename = "server_address")]
    pub host: String,
    /// Controller port.
    #[serde(rename = "server_port")]
    pub port: u16,
    /// Maximum bytes read per receive.
    pub buffer_size: usize,
    /// Literal placed between result text and working directory.
    pub separator: String,
    /// Token (case-insensitive) that terminates the command loop.
    #[serde(rename = "exit_command")]
    pub exit_token: String,
    /// Token (case-sensitive) that requests a project snapshot.
    #[serde(rename = "info_command")]
    pub info_token: String,
    /// Consecutive failed reads after which the loop gives up.
    pub max_receive_failures: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            separator: DEFAULT_SEPARATOR.to_string(),
            exit_token: DEFAULT_EXIT_TOKEN.to_string(),
            info_token: DEFAULT_INFO_TOKEN.to_string(),
            max_receive_failures: DEFAULT_MAX_RECEIVE_FAILURES,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Parse configuration from a JSON string, merging over defaults.
    ///
    /// # Errors
    /// Returns error if parsing or validation fails.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the command loop relies on.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server_address must not be empty".into()));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be greater than zero".into()));
        }
        if self.separator.is_empty() {
            return Err(ConfigError::Invalid("separator must not be empty".into()));
        }
        if self.exit_token.trim().is_empty() {
            return Err(ConfigError::Invalid("exit_command must not be empty".into()));
        }
        if self.max_receive_failures == 0 {
            return Err(ConfigError::Invalid(
                "max_receive_failures must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` string for logging.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
