//! Synthetic progress clock
//!
//! nmap gives no usable progress feed in this mode, so running jobs get a
//! steadily climbing estimate. The estimate stops at [`PROGRESS_CAP`]; only
//! the real terminal event takes a job to [`PROGRESS_DONE`].

use super::{ScanClass, ScanJob};
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Highest value the estimator will report for a running job
pub const PROGRESS_CAP: u8 = 95;

/// Progress of a job in a terminal state
pub const PROGRESS_DONE: u8 = 100;

/// Per-tick increment for a scan class
pub fn step_size(scan_class: ScanClass) -> u8 {
    match scan_class {
        ScanClass::Quick => 5,
        ScanClass::Comprehensive => 2,
        ScanClass::Stealth | ScanClass::Custom => 3,
    }
}

/// Next estimate after one tick. Never lower than `current`.
pub fn advance(current: u8, scan_class: ScanClass) -> u8 {
    if current >= PROGRESS_CAP {
        return current;
    }
    current.saturating_add(step_size(scan_class)).min(PROGRESS_CAP)
}

/// Drive a job's synthetic progress every `period` until it turns terminal,
/// is dropped from the registry, or `shutdown` fires.
pub fn spawn_ticker(
    job: Weak<Mutex<ScanJob>>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            let Some(handle) = job.upgrade() else {
                break;
            };
            let mut guard = handle.lock().await;
            if !guard.advance_progress() {
                log::debug!("Progress ticker for scan {} stopped", guard.id());
                break;
            }
        }
    })
}
