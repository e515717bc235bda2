//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use remote_tasks_core::{Config, ConfigError};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/remote_tasks.json";

/// Connect to a task controller and run the tasks it sends.
#[derive(Debug, Parser)]
#[command(name = "remote-tasks", version, about)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Controller host, overriding the config file.
    #[arg(long)]
    pub host: Option<String>,

    /// Controller port, overriding the config file.
    #[arg(long)]
    pub port: Option<u16>,

    /// Maximum bytes per read, overriding the config file.
    #[arg(long)]
    pub buffer_size: Option<usize>,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    ///
    /// # Errors
    /// Returns error if the file is unreadable or the result is invalid.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(&self.config)?;
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(buffer_size) = self.buffer_size {
            config.buffer_size = buffer_size;
        }
        config.validate()?;
        Ok(config)
    }
}
