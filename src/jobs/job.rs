//! The per-job state machine

use super::progress::{self, PROGRESS_DONE};
use super::{ScanClass, ScanId};
use crate::normalize::ScanResult;
use tokio::time::Instant;

/// Where a job is in its lifecycle. Terminal states carry their outcome, so a
/// job can never hold both a result and a failure reason.
#[derive(Debug, Clone)]
pub enum JobState {
    Running,
    Completed(ScanResult),
    Failed(String),
}

/// A single asynchronous scan tracked from start to expiry
#[derive(Debug)]
pub struct ScanJob {
    id: ScanId,
    target: String,
    scan_class: ScanClass,
    state: JobState,
    progress: u8,
    completed_at: Option<Instant>,
    delivered_at: Option<Instant>,
}

impl ScanJob {
    pub fn new(id: ScanId, target: String, scan_class: ScanClass) -> Self {
        Self {
            id,
            target,
            scan_class,
            state: JobState::Running,
            progress: 0,
            completed_at: None,
            delivered_at: None,
        }
    }

    pub fn id(&self) -> &ScanId {
        &self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn scan_class(&self) -> ScanClass {
        self.scan_class
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, JobState::Running)
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// When the job left `Running`
    pub fn completed_at(&self) -> Option<Instant> {
        self.completed_at
    }

    /// Apply one synthetic progress tick. Returns `false` once the job is
    /// terminal, which ends its ticker.
    pub fn advance_progress(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.progress = progress::advance(self.progress, self.scan_class);
        true
    }

    /// Move a running job to `Completed`. No-op on a terminal job.
    pub fn complete(&mut self, result: ScanResult) -> bool {
        self.finish(JobState::Completed(result))
    }

    /// Move a running job to `Failed`. No-op on a terminal job.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        self.finish(JobState::Failed(reason.into()))
    }

    fn finish(&mut self, state: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = state;
        self.progress = PROGRESS_DONE;
        self.completed_at = Some(Instant::now());
        true
    }

    /// Record that the outcome reached a client. Returns the delivery time
    /// on the first call only.
    pub fn mark_delivered(&mut self) -> Option<Instant> {
        if self.delivered_at.is_some() {
            return None;
        }
        let now = Instant::now();
        self.delivered_at = Some(now);
        Some(now)
    }
}
