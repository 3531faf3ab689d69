//! Scan job manager
//!
//! Owns the registry of in-flight and recently finished jobs. The registry
//! map is only locked long enough to insert, look up or remove an entry;
//! everything else happens under the job's own lock, so work on different
//! jobs never contends and work on the same job never interleaves.

use super::job::{JobState, ScanJob};
use super::progress;
use super::{ScanId, ScanRequest};
use crate::config::{JobConfig, RetentionPolicy};
use crate::normalize::{self, ScanResult};
use crate::probe::{build_flags, ProbeEngine, ProbeOutput};
use crate::utils::target::validate_target;
use crate::{Result, ScanError};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type JobHandle = Arc<Mutex<ScanJob>>;

/// Progress snapshot returned to polling clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub progress: u8,
    pub completed: bool,
}

/// Handle to the job registry. Cloning is cheap and every clone refers to
/// the same registry.
#[derive(Clone)]
pub struct ScanJobManager {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: RwLock<HashMap<ScanId, JobHandle>>,
    probe: Arc<dyn ProbeEngine>,
    config: JobConfig,
    shutdown: CancellationToken,
}

impl ScanJobManager {
    pub fn new(probe: Arc<dyn ProbeEngine>, config: JobConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: RwLock::new(HashMap::new()),
                probe,
                config,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Validate `request`, register a running job and launch its probe.
    /// Returns as soon as the job is registered.
    pub async fn start_scan(&self, request: ScanRequest) -> Result<ScanId> {
        let target = validate_target(&request.target)?.to_string();
        let options = request.options.validated()?;
        let scan_class = request.scan_type;
        let flags = build_flags(scan_class, &options);

        let id = ScanId::generate();
        let job = Arc::new(Mutex::new(ScanJob::new(id.clone(), target.clone(), scan_class)));

        self.inner
            .jobs
            .write()
            .await
            .insert(id.clone(), Arc::clone(&job));

        info!(
            "Starting scan {} of {} via {} with args: {}",
            id,
            target,
            self.inner.probe.name(),
            flags.join(" ")
        );

        // Single-fire completion channel: the probe task sends exactly once,
        // a dropped sender means the probe task died.
        let (done_tx, done_rx) = oneshot::channel::<Result<ProbeOutput>>();

        let probe = Arc::clone(&self.inner.probe);
        tokio::spawn(async move {
            let outcome = probe.run(&target, &flags).await;
            let _ = done_tx.send(outcome);
        });

        let weak_inner = Arc::downgrade(&self.inner);
        let event_id = id.clone();
        tokio::spawn(async move {
            let outcome = done_rx.await.unwrap_or_else(|_| {
                Err(ScanError::ProbeError(
                    "probe terminated unexpectedly".to_string(),
                ))
            });
            if let Some(inner) = weak_inner.upgrade() {
                ScanJobManager { inner }
                    .handle_terminal_event(event_id.as_str(), outcome)
                    .await;
            }
        });

        progress::spawn_ticker(
            Arc::downgrade(&job),
            self.inner.config.progress_tick(),
            self.inner.shutdown.child_token(),
        );

        Ok(id)
    }

    /// Current progress of a job
    pub async fn get_progress(&self, id: &str) -> Result<JobProgress> {
        let job = self.lookup(id).await?;
        let job = job.lock().await;
        Ok(JobProgress {
            progress: job.progress(),
            completed: job.is_terminal(),
        })
    }

    /// Result of a completed job. The first delivery of a terminal outcome
    /// starts the retention countdown under [`RetentionPolicy::AfterDelivery`];
    /// until it runs out the same outcome is returned on every call.
    pub async fn get_result(&self, id: &str) -> Result<ScanResult> {
        let handle = self.lookup(id).await?;
        let mut job = handle.lock().await;

        let outcome = match job.state() {
            JobState::Running => return Err(ScanError::NotReady),
            JobState::Completed(result) => Ok(result.clone()),
            JobState::Failed(reason) => Err(ScanError::ScanFailed(reason.clone())),
        };

        let first_delivery = job.mark_delivered();
        let job_id = job.id().clone();
        drop(job);

        if let Some(delivered_at) = first_delivery {
            if self.inner.config.retention_policy == RetentionPolicy::AfterDelivery {
                self.schedule_expiry(job_id, delivered_at);
            }
        }

        outcome
    }

    /// Apply a probe's terminal event to a job. Returns `false` when the job
    /// no longer exists or already left `Running`, in which case the event
    /// is dropped.
    pub async fn handle_terminal_event(&self, id: &str, outcome: Result<ProbeOutput>) -> bool {
        let handle = match self.lookup(id).await {
            Ok(handle) => handle,
            Err(_) => {
                debug!("Dropping terminal event for unknown scan {}", id);
                return false;
            }
        };

        let mut job = handle.lock().await;
        if job.is_terminal() {
            debug!("Dropping late terminal event for scan {}", id);
            return false;
        }

        match outcome {
            Ok(output) => {
                let result = normalize::normalize(&output, job.target(), job.scan_class());
                info!(
                    "Scan {} completed: host {}, {} open port(s)",
                    id,
                    result.host_info.status,
                    result.ports.len()
                );
                job.complete(result);
            }
            Err(e) => {
                error!("Scan {} error: {}", id, e);
                job.fail(e.to_string());
            }
        }

        let job_id = job.id().clone();
        let completed_at = job.completed_at();
        drop(job);

        if let Some(completed_at) = completed_at {
            if self.inner.config.retention_policy == RetentionPolicy::AfterCompletion {
                self.schedule_expiry(job_id, completed_at);
            }
        }

        true
    }

    /// Number of jobs currently visible to lookups
    pub async fn len(&self) -> usize {
        self.inner.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of jobs still waiting for their probe
    pub async fn running_count(&self) -> usize {
        let handles: Vec<JobHandle> = self.inner.jobs.read().await.values().cloned().collect();
        let mut running = 0;
        for handle in handles {
            if !handle.lock().await.is_terminal() {
                running += 1;
            }
        }
        running
    }

    /// Stop every progress ticker and pending expiry timer. Probes already
    /// running are left to finish on their own.
    pub fn shutdown(&self) {
        info!("Shutting down scan job manager");
        self.inner.shutdown.cancel();
    }

    async fn lookup(&self, id: &str) -> Result<JobHandle> {
        self.inner
            .jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(ScanError::NotFound)
    }

    /// Remove `id` from the registry once the retention window counted from
    /// `since` has passed.
    fn schedule_expiry(&self, id: ScanId, since: Instant) {
        let retention = self.inner.config.retention();
        let deadline = since + retention;
        let shutdown = self.inner.shutdown.child_token();
        let weak_inner: Weak<Inner> = Arc::downgrade(&self.inner);

        debug!("Scan {} expires in {:?}", id, retention);
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep_until(deadline) => {}
            }
            if let Some(inner) = weak_inner.upgrade() {
                if inner.jobs.write().await.remove(&id).is_some() {
                    debug!("Scan {} expired", id);
                }
            }
        });
    }
}

impl std::fmt::Debug for ScanJobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanJobManager")
            .field("probe", &self.inner.probe.name())
            .field("config", &self.inner.config)
            .finish()
    }
}
