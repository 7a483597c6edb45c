//! Server configuration.
//!
//! Slack credentials and secrets live in [`kudos_slack::SlackConfig`]; this
//! covers the HTTP surface, the dispatch pool and the score store.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Path of the redb score file. In-memory scores when unset.
    #[serde(default)]
    pub score_db: Option<PathBuf>,

    /// Deferred work configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

fn default_shutdown_timeout() -> u64 {
    30 // 30 seconds for graceful shutdown
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB, Slack payloads are small
}

fn default_request_timeout() -> u64 {
    10 // Slack retries after 3 seconds anyway
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            score_db: None,
            dispatch: DispatchConfig::default(),
            max_body_size: default_max_body_size(),
            request_timeout: default_request_timeout(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("KUDOS_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Ok(path) = std::env::var("KUDOS_SCORE_DB") {
            if !path.is_empty() {
                config.score_db = Some(PathBuf::from(path));
            }
        }

        if let Ok(workers) = std::env::var("KUDOS_WORKERS") {
            config.dispatch.workers = workers
                .parse()
                .with_context(|| format!("invalid KUDOS_WORKERS: {}", workers))?;
        }

        if let Ok(capacity) = std::env::var("KUDOS_QUEUE_CAPACITY") {
            config.dispatch.queue_capacity = capacity
                .parse()
                .with_context(|| format!("invalid KUDOS_QUEUE_CAPACITY: {}", capacity))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dispatch.workers == 0 {
            anyhow::bail!("dispatch.workers must be at least 1");
        }
        if self.dispatch.queue_capacity == 0 {
            anyhow::bail!("dispatch.queue_capacity must be at least 1");
        }
        Ok(())
    }

    /// Get request timeout as Duration.
    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Get shutdown timeout as Duration.
    pub fn shutdown_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Number of worker tasks.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum queued events before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert!(config.score_db.is_none());
        assert_eq!(config.dispatch.workers, 4);
        assert_eq!(config.dispatch.queue_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = ServerConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.listen_addr, parsed.listen_addr);
        assert_eq!(config.dispatch.workers, parsed.dispatch.workers);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: ServerConfig =
            serde_json::from_str(r#"{"score_db": "/tmp/scores.redb", "dispatch": {"workers": 2}}"#)
                .unwrap();
        assert_eq!(parsed.score_db, Some(PathBuf::from("/tmp/scores.redb")));
        assert_eq!(parsed.dispatch.workers, 2);
        assert_eq!(parsed.dispatch.queue_capacity, 256);
        assert_eq!(parsed.shutdown_timeout, 30);
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let mut config = ServerConfig::default();
        config.dispatch.workers = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.dispatch.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kudos.json");
        std::fs::write(&path, r#"{"listen_addr": "127.0.0.1:9000"}"#).unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
    }
}
