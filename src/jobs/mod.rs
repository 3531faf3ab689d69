//! Scan jobs: request types, the per-job state machine, synthetic progress
//! and the manager that owns the job registry.

pub mod job;
pub mod manager;
pub mod progress;

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

pub use job::{JobState, ScanJob};
pub use manager::{JobProgress, ScanJobManager};

/// Scan classes offered to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanClass {
    Quick,
    Comprehensive,
    Stealth,
    Custom,
}

impl ScanClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanClass::Quick => "quick",
            ScanClass::Comprehensive => "comprehensive",
            ScanClass::Stealth => "stealth",
            ScanClass::Custom => "custom",
        }
    }
}

impl fmt::Display for ScanClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-supplied options layered on top of the scan class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    /// nmap style port specification, e.g. `1-1000` or `22,80,443`
    pub port_range: Option<String>,
    pub scan_udp: bool,
    /// Per-host timeout in seconds
    pub timeout: Option<u64>,
}

impl ScanOptions {
    /// Check the options and return them in canonical form. A blank port
    /// range is treated as absent.
    pub fn validated(self) -> crate::Result<Self> {
        let port_range = match self.port_range {
            Some(range) if !range.trim().is_empty() => {
                let range = range.trim().to_string();
                crate::utils::port_range::parse_port_range(&range)?;
                Some(range)
            }
            _ => None,
        };

        if self.timeout == Some(0) {
            return Err(crate::ScanError::InvalidRequest(
                "Timeout must be a positive number of seconds".to_string(),
            ));
        }

        Ok(Self {
            port_range,
            scan_udp: self.scan_udp,
            timeout: self.timeout,
        })
    }
}

/// Body of a start request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub target: String,
    pub scan_type: ScanClass,
    #[serde(default)]
    pub options: ScanOptions,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>, scan_type: ScanClass) -> Self {
        Self {
            target: target.into(),
            scan_type,
            options: ScanOptions::default(),
        }
    }

    pub fn with_port_range(mut self, range: impl Into<String>) -> Self {
        self.options.port_range = Some(range.into());
        self
    }

    pub fn with_udp(mut self, scan_udp: bool) -> Self {
        self.options.scan_udp = scan_udp;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.options.timeout = Some(seconds);
        self
    }
}

/// Opaque job identifier handed out by `start`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ScanId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
