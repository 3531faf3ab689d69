//! Target validation
//!
//! Targets are handed to nmap as a single argument, so anything that could be
//! read as a flag or split into several arguments is rejected up front.

use crate::{Result, ScanError};
use once_cell::sync::Lazy;
use regex::Regex;

// Hostnames, IPv4/IPv6 literals and CIDR blocks.
static TARGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._:/-]+$").expect("target pattern is valid"));

/// Validate a scan target and return it trimmed.
pub fn validate_target(target: &str) -> Result<&str> {
    let target = target.trim();

    if target.is_empty() {
        return Err(ScanError::InvalidRequest("Target cannot be empty".to_string()));
    }

    if target.starts_with('-') {
        return Err(ScanError::InvalidRequest(format!(
            "Target '{}' looks like a command line flag",
            target
        )));
    }

    if !TARGET_PATTERN.is_match(target) {
        return Err(ScanError::InvalidRequest(format!(
            "Target '{}' contains invalid characters",
            target
        )));
    }

    Ok(target)
}
