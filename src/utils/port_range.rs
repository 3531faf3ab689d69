//! Port range parsing for nmap-style `-p` specifications
//!
//! Accepts comma separated entries, each a single port or an inclusive
//! `start-end` range, optionally prefixed with `T:` or `U:`.

use crate::{Result, ScanError};
use std::ops::RangeInclusive;

/// Parse a port specification into one inclusive span per entry, in the
/// order given. Spans are never expanded into individual ports, so the cost
/// is linear in the length of the specification. Every port must lie in
/// 1-65535.
pub fn parse_port_range(port_spec: &str) -> Result<Vec<RangeInclusive<u16>>> {
    let mut spans = Vec::new();

    for part in port_spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(invalid(format!("Empty entry in port range '{}'", port_spec)));
        }

        let port_part = match part.split_once(':') {
            Some((proto, rest)) if proto.eq_ignore_ascii_case("t") || proto.eq_ignore_ascii_case("u") => rest,
            Some(_) => return Err(invalid(format!("Unknown protocol prefix in '{}'", part))),
            None => part,
        };

        if let Some((start, end)) = port_part.split_once('-') {
            let start = parse_port(start)?;
            let end = parse_port(end)?;
            if start > end {
                return Err(invalid(format!(
                    "Start port {} cannot be greater than end port {}",
                    start, end
                )));
            }
            spans.push(start..=end);
        } else {
            let port = parse_port(port_part)?;
            spans.push(port..=port);
        }
    }

    Ok(spans)
}

fn parse_port(raw: &str) -> Result<u16> {
    let raw = raw.trim();
    let port: u16 = raw
        .parse()
        .map_err(|e| invalid(format!("Invalid port '{}': {}", raw, e)))?;
    if port == 0 {
        return Err(invalid("Port 0 is not valid".to_string()));
    }
    Ok(port)
}

fn invalid(msg: String) -> ScanError {
    ScanError::InvalidRequest(msg)
}
