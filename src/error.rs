//! Error handling for the scan job service
//!
//! A single error enum covers both the public job contract (invalid request,
//! unknown job, result not ready, failed scan) and the failures the probe
//! adapter can hit while driving nmap.

use thiserror::Error;

/// Main error type for scan operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Scan not found")]
    NotFound,

    #[error("Scan not completed yet")]
    NotReady,

    /// The probe reported an error; the reason is surfaced verbatim.
    #[error("{0}")]
    ScanFailed(String),

    /// Failure reported by the probe itself, kept as the probe worded it
    #[error("{0}")]
    ProbeError(String),

    #[error("Probe timed out")]
    TimeoutError,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    /// Whether the error belongs to the client-facing job contract rather
    /// than to the probe or the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidRequest(_) | ScanError::NotFound | ScanError::NotReady
        )
    }
}

impl From<std::num::ParseIntError> for ScanError {
    fn from(e: std::num::ParseIntError) -> Self {
        ScanError::ParseError(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for ScanError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ScanError::TimeoutError
    }
}

impl From<quick_xml::DeError> for ScanError {
    fn from(e: quick_xml::DeError) -> Self {
        ScanError::ParseError(format!("Malformed nmap XML: {}", e))
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(e: toml::de::Error) -> Self {
        ScanError::ConfigError(format!("Failed to parse TOML: {}", e))
    }
}
