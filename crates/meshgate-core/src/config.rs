//! Configuration system for meshgate.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $MESHGATE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/meshgate/config.toml
//!   3. ~/.config/meshgate/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub network: NetworkConfig,
    pub timing: TimingConfig,
    pub hub: HubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Seed node serving `/api/network/peers`.
    pub seed_peer_url: String,
    /// Port used for every outbound call to a peer.
    pub peer_api_port: u16,
    /// Inbound listen port.
    pub gateway_port: u16,
    /// Inbound listen address.
    pub listen_addr: String,
    /// Host substituted for peers advertising a loopback address.
    pub loopback_alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Timeout for directory lookups and fan-out fetches.
    pub request_timeout_ms: u64,
    /// Period of the discovery loop.
    pub discovery_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Events kept in memory, newest first.
    pub buffer_capacity: usize,
    /// Per-subscriber queue depth before events are dropped for that subscriber.
    pub subscriber_queue: usize,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            seed_peer_url: "http://host.docker.internal:7000".to_string(),
            peer_api_port: 7000,
            gateway_port: 8080,
            listen_addr: "0.0.0.0".to_string(),
            loopback_alias: "host.docker.internal".to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 2000,
            discovery_interval_secs: 5,
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            subscriber_queue: 100,
        }
    }
}

impl TimingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs.max(1))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("meshgate")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl GatewayConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            GatewayConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file without applying env overrides.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("MESHGATE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&GatewayConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply overrides from a key lookup (the process env in production).
    ///
    /// Unparseable numbers are ignored and the current value stands.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SEED_PEER_URL") {
            self.network.seed_peer_url = v.trim_end_matches('/').to_string();
        }
        if let Some(p) = lookup("PEER_API_PORT").and_then(|v| v.parse().ok()) {
            self.network.peer_api_port = p;
        }
        if let Some(p) = lookup("GATEWAY_PORT").and_then(|v| v.parse().ok()) {
            self.network.gateway_port = p;
        }
        if let Some(v) = lookup("MESHGATE_LISTEN_ADDR") {
            self.network.listen_addr = v;
        }
        if let Some(v) = lookup("MESHGATE_LOOPBACK_ALIAS") {
            self.network.loopback_alias = v;
        }
    }
}
