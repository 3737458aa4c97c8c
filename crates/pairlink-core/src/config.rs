//! Configuration resolution for pairlink.
//!
//! Implements layered config resolution:
//! 1. Built-in defaults
//! 2. JSON config file (`--config` or `PAIRLINK_CONFIG`)
//! 3. Environment variables
//! 4. CLI arguments (applied by the binary, highest priority)
//!
//! Every section and field is optional in the file; missing values keep
//! their defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "PAIRLINK_CONFIG";

/// Complete pairlink configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub codes: CodeConfig,
    pub sessions: SessionConfig,
    pub transport: TransportConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Room code generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CodeConfig {
    /// Smallest code handed out (inclusive).
    pub min: u32,
    /// Largest code handed out (inclusive).
    pub max: u32,
    /// Collisions tolerated before `create` gives up.
    pub max_attempts: u32,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            min: 100_000,
            max: 999_999,
            max_attempts: 64,
        }
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Unpaired rooms older than this are expired. `None` disables the sweep.
    pub idle_timeout_secs: Option<u64>,
    /// How often the idle sweep runs (seconds).
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: None,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Per-connection transport settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    /// Bounded outbound queue length per connection.
    pub send_queue: usize,
    /// WebSocket ping interval (seconds).
    pub ping_interval_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            send_queue: 256,
            ping_interval_secs: 30,
        }
    }
}

impl TransportConfig {
    pub const fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

impl Config {
    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.codes.min > self.codes.max {
            return Err(Error::Config(format!(
                "codes.min ({}) must not exceed codes.max ({})",
                self.codes.min, self.codes.max
            )));
        }
        if self.codes.max_attempts == 0 {
            return Err(Error::Config("codes.max_attempts must be at least 1".into()));
        }
        if self.transport.ping_interval_secs == 0 {
            return Err(Error::Config("transport.ping_interval_secs must be at least 1".into()));
        }
        if self.transport.send_queue == 0 {
            return Err(Error::Config("transport.send_queue must be at least 1".into()));
        }
        if self.sessions.idle_timeout_secs.is_some() && self.sessions.sweep_interval_secs == 0 {
            return Err(Error::Config(
                "sessions.sweep_interval_secs must be at least 1 when idle expiry is on".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration with layered resolution.
///
/// `path` wins over `PAIRLINK_CONFIG`; with neither, only defaults and
/// environment overrides apply.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
    let mut config = match path.or(env_path.as_deref()) {
        Some(p) => load_config_file(p)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `PAIRLINK_*` overrides. Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(addr) = lookup("PAIRLINK_LISTEN_ADDR").and_then(|v| v.parse().ok()) {
        config.server.listen_addr = addr;
    }
    if let Some(secs) = lookup("PAIRLINK_IDLE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.sessions.idle_timeout_secs = Some(secs);
    }
    if let Some(n) = lookup("PAIRLINK_SEND_QUEUE").and_then(|v| v.parse().ok()) {
        config.transport.send_queue = n;
    }
}
