//! Shared fixtures: a scripted probe engine and canned probe reports
#![allow(dead_code)]

use async_trait::async_trait;
use portscan::config::{JobConfig, RetentionPolicy};
use portscan::probe::{RawHost, RawPort};
use portscan::{ProbeEngine, ProbeOutput, ScanError, ScanJobManager};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TICK: Duration = Duration::from_millis(500);
pub const RETENTION: Duration = Duration::from_secs(60);

/// What a [`FakeProbe`] does when run
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Never finishes
    Hang,
    Succeed { after: Duration, output: ProbeOutput },
    Fail { after: Duration, reason: String },
    Panic,
}

/// Probe engine that follows a fixed script and records every invocation
#[derive(Debug)]
pub struct FakeProbe {
    behavior: Behavior,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeProbe {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn hanging() -> Arc<Self> {
        Self::new(Behavior::Hang)
    }

    pub fn succeeding_after(after: Duration, output: ProbeOutput) -> Arc<Self> {
        Self::new(Behavior::Succeed { after, output })
    }

    pub fn failing_after(after: Duration, reason: &str) -> Arc<Self> {
        Self::new(Behavior::Fail {
            after,
            reason: reason.to_string(),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProbeEngine for FakeProbe {
    async fn run(&self, target: &str, flags: &[String]) -> portscan::Result<ProbeOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((target.to_string(), flags.to_vec()));

        match &self.behavior {
            Behavior::Hang => std::future::pending().await,
            Behavior::Succeed { after, output } => {
                tokio::time::sleep(*after).await;
                Ok(output.clone())
            }
            Behavior::Fail { after, reason } => {
                tokio::time::sleep(*after).await;
                Err(ScanError::ProbeError(reason.clone()))
            }
            Behavior::Panic => panic!("probe crashed"),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn job_config(policy: RetentionPolicy) -> JobConfig {
    JobConfig {
        progress_tick_ms: TICK.as_millis() as u64,
        retention_secs: RETENTION.as_secs(),
        retention_policy: policy,
    }
}

pub fn manager_with(probe: Arc<FakeProbe>) -> ScanJobManager {
    ScanJobManager::new(probe, job_config(RetentionPolicy::AfterDelivery))
}

fn open_port(port: u16, service: &str) -> RawPort {
    RawPort {
        port,
        protocol: Some("tcp".to_string()),
        service: Some(service.to_string()),
        version: None,
    }
}

/// Host up with 22/ssh and 80/http open
pub fn ssh_and_http_report() -> ProbeOutput {
    ProbeOutput {
        hosts: vec![RawHost {
            status: Some("up".to_string()),
            open_ports: vec![open_port(22, "ssh"), open_port(80, "http")],
            rtt_ms: Some(0.8),
            ..Default::default()
        }],
        raw_text: "Nmap scan report for 10.0.0.5\nHost is up.\n22/tcp open ssh\n80/tcp open http\n"
            .to_string(),
    }
}

/// Host reported down but with a stray open port
pub fn contradictory_down_report() -> ProbeOutput {
    ProbeOutput {
        hosts: vec![RawHost {
            status: Some("down".to_string()),
            open_ports: vec![open_port(443, "https")],
            ..Default::default()
        }],
        raw_text: String::new(),
    }
}

/// Advance the paused clock by `ticks` progress intervals plus a little slack
pub async fn wait_ticks(ticks: u32) {
    tokio::time::sleep(TICK * ticks + Duration::from_millis(10)).await;
}
