//! Server configuration.
//!
//! Every field has a default, so an empty (or absent) YAML file yields a
//! working configuration. Command-line values are layered on top by
//! [`crate::cli::Cli::into_config`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of workers in the pool.
    pub workers: usize,
    /// Pending-connection backlog passed to `listen(2)`.
    pub backlog: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub idle_timeout_secs: u64,
    pub max_requests_per_connection: usize,
    /// Upper bound on the bytes buffered for a single request.
    pub max_request_size: usize,
    pub queue_poll_millis: u64,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub root: PathBuf,
    /// Relative to `root`.
    pub uploads_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: 10,
            backlog: 50,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30,
            max_requests_per_connection: 100,
            max_request_size: 8192,
            queue_poll_millis: 1000,
            shutdown_grace_secs: 2,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
            uploads_dir: PathBuf::from("uploads"),
        }
    }
}

impl LimitsConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn queue_poll_interval(&self) -> Duration {
        Duration::from_millis(self.queue_poll_millis)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl ContentConfig {
    pub fn uploads_path(&self) -> PathBuf {
        self.root.join(&self.uploads_dir)
    }
}

impl Config {
    /// Loads the YAML file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.server.workers > 0, "server.workers must be at least 1");
        anyhow::ensure!(
            self.limits.max_requests_per_connection > 0,
            "limits.max_requests_per_connection must be at least 1"
        );
        anyhow::ensure!(
            self.limits.max_request_size > 0,
            "limits.max_request_size must be at least 1"
        );
        anyhow::ensure!(
            self.limits.queue_poll_millis > 0,
            "limits.queue_poll_millis must be at least 1"
        );
        Ok(())
    }

    /// True when bound to an all-interfaces address.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.server.host.as_str(), "0.0.0.0" | "::" | "[::]")
    }
}
