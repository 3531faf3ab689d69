//! nmap flag construction

use crate::jobs::{ScanClass, ScanOptions};

/// Flags implied by the scan class alone
pub fn base_flags(scan_class: ScanClass) -> &'static [&'static str] {
    match scan_class {
        // Faster timing template
        ScanClass::Quick => &["-T4"],
        // Normal timing plus OS/version detection, default scripts, traceroute
        ScanClass::Comprehensive => &["-T3", "-A"],
        // SYN scan with slower timing
        ScanClass::Stealth => &["-sS", "-T2"],
        ScanClass::Custom => &[],
    }
}

/// Build the full flag list for a job. `options` must already be validated.
pub fn build_flags(scan_class: ScanClass, options: &ScanOptions) -> Vec<String> {
    let mut flags: Vec<String> = base_flags(scan_class)
        .iter()
        .map(|flag| flag.to_string())
        .collect();

    if let Some(range) = &options.port_range {
        flags.push("-p".to_string());
        flags.push(range.clone());
    }

    if options.scan_udp {
        flags.push("-sU".to_string());
    }

    if let Some(timeout) = options.timeout {
        flags.push("--host-timeout".to_string());
        flags.push(format!("{}s", timeout));
    }

    flags
}
