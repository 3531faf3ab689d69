//! Configuration module for the scan job service

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level service configuration, usually loaded from `~/.portscan.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub probe: ProbeConfig,
    pub jobs: JobConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// How the external nmap binary is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Path to nmap binary
    pub nmap_path: String,
    /// Hard ceiling on a single nmap run, in seconds
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            nmap_path: "nmap".to_string(),
            timeout_secs: 3600,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// When a finished job is dropped from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep the job until its outcome has been fetched once, then expire it
    /// after the retention window. Jobs nobody fetches are kept.
    AfterDelivery,
    /// Expire the job a retention window after it reaches a terminal state,
    /// fetched or not.
    AfterCompletion,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::AfterDelivery
    }
}

/// Job manager tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Synthetic progress tick interval in milliseconds
    pub progress_tick_ms: u64,
    /// Retention window in seconds
    pub retention_secs: u64,
    pub retention_policy: RetentionPolicy,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: 500,
            retention_secs: 60,
            retention_policy: RetentionPolicy::AfterDelivery,
        }
    }
}

impl JobConfig {
    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            crate::ScanError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Location of the per-user configuration file, `~/.portscan.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".portscan.toml")
    }

    /// Load `path` if it exists, otherwise fall back to defaults. A file
    /// that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::from_toml_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from `~/.portscan.toml`, falling back to defaults
    pub fn load_default_config() -> crate::Result<Self> {
        Self::load_or_default(&Self::default_config_path())
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(crate::ScanError::ConfigError(
                "server.host cannot be empty".to_string(),
            ));
        }

        if self.probe.nmap_path.trim().is_empty() {
            return Err(crate::ScanError::ConfigError(
                "probe.nmap_path cannot be empty".to_string(),
            ));
        }

        if self.probe.timeout_secs == 0 {
            return Err(crate::ScanError::ConfigError(
                "probe.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.jobs.progress_tick_ms == 0 {
            return Err(crate::ScanError::ConfigError(
                "jobs.progress_tick_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
