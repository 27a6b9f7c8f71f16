//! Client configuration
//!
//! Resolved once (from defaults, an optional YAML file and the environment)
//! and passed explicitly to [`Connector`](crate::Connector) and
//! [`available_plugins`](crate::available_plugins).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the IPC directory
pub const IPC_DIR_ENV: &str = "LSM_UDS_PATH";

/// Default directory holding plugin sockets
pub const DEFAULT_IPC_DIR: &str = "/var/run/lsm/ipc";

// =============================================================================
// Job Polling
// =============================================================================

/// Backoff settings for [`Connection::wait`](crate::Connection::wait)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPollConfig {
    /// Delay before the second poll
    pub initial_interval_ms: u64,
    /// Upper bound on the delay between polls
    pub max_interval_ms: u64,
    /// Give up after this long; `None` polls until the job finishes
    pub max_elapsed_ms: Option<u64>,
}

impl Default for JobPollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 100,
            max_interval_ms: 5_000,
            max_elapsed_ms: None,
        }
    }
}

impl JobPollConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed_ms.map(Duration::from_millis)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Process-wide client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Directory containing one socket per plugin
    pub ipc_dir: PathBuf,
    /// Timeout used for each plugin queried during discovery
    pub discovery_timeout_ms: u32,
    /// Largest response frame accepted from a plugin
    pub max_frame_bytes: usize,
    /// Job wait helper backoff
    pub job_poll: JobPollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ipc_dir: PathBuf::from(DEFAULT_IPC_DIR),
            discovery_timeout_ms: 30_000,
            max_frame_bytes: 32 * 1024 * 1024,
            job_poll: JobPollConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the environment
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Parse YAML; missing keys take their defaults
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| Error::Configuration(format!("invalid client config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file, then apply environment overrides
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_yaml_str(&text)?.with_env())
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Self {
        if let Some(dir) = std::env::var_os(IPC_DIR_ENV) {
            if !dir.is_empty() {
                self.ipc_dir = PathBuf::from(dir);
            }
        }
        self
    }

    pub fn with_ipc_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ipc_dir = dir.into();
        self
    }

    fn validate(&self) -> Result<()> {
        if self.discovery_timeout_ms == 0 {
            return Err(Error::Configuration(
                "discovery_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(Error::Configuration(
                "max_frame_bytes must be greater than zero".into(),
            ));
        }
        if self.job_poll.initial_interval_ms == 0
            || self.job_poll.max_interval_ms < self.job_poll.initial_interval_ms
        {
            return Err(Error::Configuration(
                "job_poll intervals must be positive and max >= initial".into(),
            ));
        }
        Ok(())
    }
}
