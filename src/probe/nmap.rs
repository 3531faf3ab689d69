//! nmap probe - runs the nmap binary out of process and parses its report

use super::{xml, ProbeEngine, ProbeOutput};
use crate::config::ProbeConfig;
use crate::{Result, ScanError};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;

/// nmap integration engine
#[derive(Debug, Clone)]
pub struct NmapProbe {
    config: ProbeConfig,
}

impl NmapProbe {
    /// Create new nmap engine
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Assemble the full argument list: job flags, XML report path, target.
    fn build_args(flags: &[String], xml_path: &str, target: &str) -> Vec<String> {
        let mut args = flags.to_vec();
        args.push("-oX".to_string());
        args.push(xml_path.to_string());
        args.push(target.to_string());
        args
    }

    /// Execute nmap command
    async fn execute_nmap_command(&self, args: &[String]) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.config.nmap_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| ScanError::ProbeError(format!("Failed to execute nmap: {}", e)))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        })
    }
}

impl Default for NmapProbe {
    fn default() -> Self {
        Self::new(ProbeConfig::default())
    }
}

#[async_trait]
impl ProbeEngine for NmapProbe {
    async fn run(&self, target: &str, flags: &[String]) -> Result<ProbeOutput> {
        // nmap writes the machine readable report here while stdout keeps the
        // human readable one
        let xml_file = tempfile::Builder::new()
            .prefix("portscan-")
            .suffix(".xml")
            .tempfile()?;
        let xml_path = xml_file.path().to_string_lossy().to_string();

        let args = Self::build_args(flags, &xml_path, target);
        debug!("Executing nmap with args: {:?}", args);

        let start_time = Instant::now();
        let output = timeout(self.config.timeout(), self.execute_nmap_command(&args)).await??;

        if !output.success {
            let stderr = output.stderr.trim();
            let reason = if stderr.is_empty() {
                match output.exit_code {
                    Some(code) => format!("nmap exited with status {}", code),
                    None => "nmap was terminated by a signal".to_string(),
                }
            } else {
                stderr.to_string()
            };
            return Err(ScanError::ProbeError(reason));
        }

        if !output.stderr.trim().is_empty() {
            warn!("nmap reported for {}: {}", target, output.stderr.trim());
        }

        let report = tokio::fs::read_to_string(xml_file.path()).await?;
        let hosts = xml::parse_nmap_xml(&report)?;

        info!(
            "nmap finished {} in {:.2}s ({} host record(s))",
            target,
            start_time.elapsed().as_secs_f64(),
            hosts.len()
        );

        Ok(ProbeOutput {
            hosts,
            raw_text: output.stdout,
        })
    }

    fn name(&self) -> &str {
        "nmap"
    }
}

/// Command execution output
#[derive(Debug)]
struct CommandOutput {
    stdout: String,
    stderr: String,
    success: bool,
    exit_code: Option<i32>,
}
