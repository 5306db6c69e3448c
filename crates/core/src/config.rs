// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon and client configuration
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! ```toml
//! listen_addr = "127.0.0.1:8080"
//! data_dir = "/var/lib/reclog"
//! flush_interval = "1s"
//! request_timeout = "5s"
//! buffer_capacity = 4096
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Name of the config file looked up inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Loopback address the daemon listens on when nothing else is configured
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default write buffer size for the record store
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

pub const ENV_LISTEN_ADDR: &str = "RL_LISTEN_ADDR";
pub const ENV_DATA_DIR: &str = "RL_DATA_DIR";
pub const ENV_FLUSH_INTERVAL: &str = "RL_FLUSH_INTERVAL";
pub const ENV_REQUEST_TIMEOUT: &str = "RL_REQUEST_TIMEOUT";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration shared by `rld` and `rl`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// TCP address the daemon listens on
    pub listen_addr: SocketAddr,
    /// Directory holding the record file, daemon log and lock file
    pub data_dir: PathBuf,
    /// How often the daemon flushes buffered appends to the file
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
    /// Per-request read/write timeout on daemon connections
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Write buffer size of the record store, in bytes
    pub buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: default_data_dir(|key| std::env::var(key).ok()),
            flush_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(5),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration using the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment lookup
    ///
    /// Without an explicit path, `config.toml` inside the data directory is
    /// used when it exists.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let data_dir = lookup(ENV_DATA_DIR)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| default_data_dir(&lookup));
                let candidate = data_dir.join(CONFIG_FILE);
                if candidate.exists() {
                    Self::from_file(&candidate)?
                } else {
                    Self {
                        data_dir,
                        ..Self::default()
                    }
                }
            }
        };

        let config = config.apply_env(lookup)?;
        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides on top of file values
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_LISTEN_ADDR) {
            self.listen_addr = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_LISTEN_ADDR,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_FLUSH_INTERVAL) {
            self.flush_interval = parse_env_duration(ENV_FLUSH_INTERVAL, value)?;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout = parse_env_duration(ENV_REQUEST_TIMEOUT, value)?;
        }
        Ok(self)
    }

    /// Reject values the daemon cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "flush_interval must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Path to the record file
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.log")
    }

    /// Path to the daemon's own log output
    pub fn daemon_log_path(&self) -> PathBuf {
        self.data_dir.join("daemon.log")
    }

    /// Path to the lock/PID file
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("daemon.pid")
    }

    /// Path to the version file
    pub fn version_path(&self) -> PathBuf {
        self.data_dir.join("daemon.version")
    }
}

fn parse_env_duration(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    humantime::parse_duration(&value).map_err(|_| ConfigError::InvalidEnv { var, value })
}

/// State directory: `$XDG_STATE_HOME/reclog`, else `~/.local/state/reclog`
fn default_data_dir<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(xdg) = lookup("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("reclog");
    }
    match lookup("HOME") {
        Some(home) => PathBuf::from(home).join(".local/state/reclog"),
        None => PathBuf::from(".reclog"),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
