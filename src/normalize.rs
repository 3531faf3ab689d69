//! Result normalization
//!
//! Turns the probe's raw host record into the result shape clients consume.
//! Every optional field degrades to a fixed default, so normalization cannot
//! fail.

use crate::jobs::ScanClass;
use crate::probe::{ProbeOutput, RawHost, RawPort};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Canonical scan result returned by the results endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub target: String,
    pub timestamp: String,
    pub scan_type: ScanClass,
    pub ports: Vec<PortEntry>,
    pub host_info: HostInfo,
    pub raw_output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortEntry {
    pub port: u16,
    pub service: String,
    pub state: String,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub status: String,
    /// Round trip time in milliseconds
    pub latency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    pub hostnames: Vec<String>,
    pub os: String,
}

pub const STATUS_DOWN: &str = "down";
pub const STATUS_UNKNOWN: &str = "unknown";
pub const OS_UNKNOWN: &str = "Unknown";
const DEFAULT_PROTOCOL: &str = "tcp";
const PORT_STATE_OPEN: &str = "open";

/// Normalize a probe report, stamped with the current local time.
pub fn normalize(output: &ProbeOutput, target: &str, scan_class: ScanClass) -> ScanResult {
    normalize_at(output, target, scan_class, Local::now())
}

/// Normalize a probe report with an explicit timestamp.
pub fn normalize_at(
    output: &ProbeOutput,
    target: &str,
    scan_class: ScanClass,
    now: DateTime<Local>,
) -> ScanResult {
    let empty = RawHost::default();
    let host = output.hosts.first();
    let record = host.unwrap_or(&empty);

    let mut ports: Vec<PortEntry> = record.open_ports.iter().map(port_entry).collect();
    ports.sort_by(|a, b| a.port.cmp(&b.port).then_with(|| a.protocol.cmp(&b.protocol)));
    ports.dedup_by(|a, b| a.port == b.port && a.protocol == b.protocol);

    let reported_status = non_empty(record.status.as_deref());
    let host_down = host.is_none()
        || reported_status.is_some_and(|s| s.eq_ignore_ascii_case(STATUS_DOWN))
        || ports.is_empty();

    // A down host or an empty port list overrides anything else the probe said
    let status = if host_down {
        ports.clear();
        STATUS_DOWN.to_string()
    } else {
        reported_status.unwrap_or(STATUS_UNKNOWN).to_string()
    };

    let hostnames: Vec<String> = record
        .hostnames
        .iter()
        .filter(|name| !name.trim().is_empty())
        .cloned()
        .collect();

    ScanResult {
        target: target.to_string(),
        timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        scan_type: scan_class,
        ports,
        host_info: HostInfo {
            status,
            latency: record.rtt_ms.filter(|rtt| rtt.is_finite() && *rtt >= 0.0).unwrap_or(0.0),
            mac_address: non_empty(record.mac.as_deref()).map(str::to_string),
            hostnames: if hostnames.is_empty() {
                vec![target.to_string()]
            } else {
                hostnames
            },
            os: non_empty(record.os.as_deref()).unwrap_or(OS_UNKNOWN).to_string(),
        },
        raw_output: output.raw_text.clone(),
    }
}

fn port_entry(raw: &RawPort) -> PortEntry {
    PortEntry {
        port: raw.port,
        service: raw.service.clone().unwrap_or_default(),
        state: PORT_STATE_OPEN.to_string(),
        protocol: non_empty(raw.protocol.as_deref())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| DEFAULT_PROTOCOL.to_string()),
        version: non_empty(raw.version.as_deref()).map(str::to_string),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap()
    }

    fn port(port: u16, service: &str) -> RawPort {
        RawPort {
            port,
            protocol: None,
            service: Some(service.to_string()),
            version: None,
        }
    }

    fn up_host(ports: Vec<RawPort>) -> RawHost {
        RawHost {
            status: Some("up".to_string()),
            open_ports: ports,
            ..Default::default()
        }
    }

    #[test]
    fn test_open_ports_are_mapped() {
        let output = ProbeOutput {
            hosts: vec![up_host(vec![port(80, "http"), port(22, "ssh")])],
            raw_text: "Nmap scan report for 10.0.0.5".to_string(),
        };

        let result = normalize_at(&output, "10.0.0.5", ScanClass::Quick, fixed_now());

        assert_eq!(result.timestamp, "2026-03-01 12:30:00");
        assert_eq!(result.host_info.status, "up");
        assert_eq!(result.ports.len(), 2);
        assert_eq!(result.ports[0].port, 22);
        assert_eq!(result.ports[0].service, "ssh");
        assert_eq!(result.ports[1].port, 80);
        assert!(result.ports.iter().all(|p| p.state == "open" && p.protocol == "tcp"));
        assert_eq!(result.raw_output, "Nmap scan report for 10.0.0.5");
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let output = ProbeOutput {
            hosts: vec![RawHost {
                open_ports: vec![RawPort {
                    port: 8080,
                    ..Default::default()
                }],
                ..Default::default()
            }],
            raw_text: String::new(),
        };

        let result = normalize_at(&output, "box", ScanClass::Custom, fixed_now());
        let info = &result.host_info;

        assert_eq!(info.status, STATUS_UNKNOWN);
        assert_eq!(info.latency, 0.0);
        assert_eq!(info.mac_address, None);
        assert_eq!(info.hostnames, vec!["box"]);
        assert_eq!(info.os, OS_UNKNOWN);
        assert_eq!(result.ports[0].service, "");
        assert_eq!(result.ports[0].protocol, "tcp");
        assert_eq!(result.ports[0].version, None);
    }

    #[test]
    fn test_known_protocol_is_kept() {
        let mut dns = port(53, "domain");
        dns.protocol = Some("udp".to_string());
        let output = ProbeOutput {
            hosts: vec![up_host(vec![dns])],
            raw_text: String::new(),
        };

        let result = normalize_at(&output, "ns1", ScanClass::Custom, fixed_now());
        assert_eq!(result.ports[0].protocol, "udp");
    }

    #[test]
    fn test_down_host_drops_ports() {
        let mut host = up_host(vec![port(22, "ssh")]);
        host.status = Some("down".to_string());
        let output = ProbeOutput {
            hosts: vec![host],
            raw_text: String::new(),
        };

        let result = normalize_at(&output, "10.0.0.9", ScanClass::Quick, fixed_now());
        assert_eq!(result.host_info.status, STATUS_DOWN);
        assert!(result.ports.is_empty());
    }

    #[test]
    fn test_zero_ports_means_down() {
        let output = ProbeOutput {
            hosts: vec![up_host(vec![])],
            raw_text: String::new(),
        };

        let result = normalize_at(&output, "10.0.0.9", ScanClass::Stealth, fixed_now());
        assert_eq!(result.host_info.status, STATUS_DOWN);
        assert!(result.ports.is_empty());
    }

    #[test]
    fn test_no_host_record() {
        let result = normalize_at(&ProbeOutput::default(), "ghost", ScanClass::Quick, fixed_now());
        assert_eq!(result.host_info.status, STATUS_DOWN);
        assert_eq!(result.host_info.hostnames, vec!["ghost"]);
        assert_eq!(result.host_info.os, OS_UNKNOWN);
        assert!(result.ports.is_empty());
    }

    #[test]
    fn test_only_first_host_is_used() {
        let mut second = up_host(vec![port(443, "https")]);
        second.hostnames = vec!["other".to_string()];
        let output = ProbeOutput {
            hosts: vec![up_host(vec![port(22, "ssh")]), second],
            raw_text: String::new(),
        };

        let result = normalize_at(&output, "10.0.0.0/30", ScanClass::Quick, fixed_now());
        assert_eq!(result.ports.len(), 1);
        assert_eq!(result.ports[0].port, 22);
        assert_eq!(result.host_info.hostnames, vec!["10.0.0.0/30"]);
    }

    #[test]
    fn test_json_shape() {
        let mut ssh = port(22, "ssh");
        ssh.version = Some("OpenSSH 8.2p1".to_string());
        let mut host = up_host(vec![ssh, port(80, "http")]);
        host.mac = Some("00:1A:2B:3C:4D:5E".to_string());
        host.rtt_ms = Some(1.5);
        let output = ProbeOutput {
            hosts: vec![host],
            raw_text: "raw".to_string(),
        };

        let json = serde_json::to_value(normalize_at(&output, "10.0.0.5", ScanClass::Comprehensive, fixed_now())).unwrap();

        assert_eq!(json["scanType"], "comprehensive");
        assert_eq!(json["rawOutput"], "raw");
        assert_eq!(json["hostInfo"]["macAddress"], "00:1A:2B:3C:4D:5E");
        assert_eq!(json["hostInfo"]["latency"], 1.5);
        assert_eq!(json["ports"][0]["version"], "OpenSSH 8.2p1");
        assert!(json["ports"][1].get("version").is_none());
    }
}
