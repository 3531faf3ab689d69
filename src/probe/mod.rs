//! Probe engine seam
//!
//! The job manager never talks to nmap directly. It hands a target and a flag
//! list to a [`ProbeEngine`] and waits for the single outcome the engine
//! returns.

pub mod flags;
pub mod nmap;
mod xml;

use crate::Result;
use async_trait::async_trait;

pub use flags::build_flags;
pub use nmap::NmapProbe;

/// An out-of-process probing tool
#[async_trait]
pub trait ProbeEngine: Send + Sync {
    /// Probe `target` with `flags`, resolving exactly once with the parsed
    /// report or the reason the run failed.
    async fn run(&self, target: &str, flags: &[String]) -> Result<ProbeOutput>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Everything a probe run produced
#[derive(Debug, Clone, Default)]
pub struct ProbeOutput {
    pub hosts: Vec<RawHost>,
    /// Human readable report, kept verbatim
    pub raw_text: String,
}

/// One host as reported by the probe. Every field is optional because nmap
/// omits whatever it could not determine.
#[derive(Debug, Clone, Default)]
pub struct RawHost {
    pub status: Option<String>,
    pub mac: Option<String>,
    pub hostnames: Vec<String>,
    pub open_ports: Vec<RawPort>,
    pub os: Option<String>,
    /// Smoothed round trip time in milliseconds
    pub rtt_ms: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct RawPort {
    pub port: u16,
    pub protocol: Option<String>,
    pub service: Option<String>,
    pub version: Option<String>,
}
