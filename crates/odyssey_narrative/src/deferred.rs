//! Work scheduled after the response has been returned.
//!
//! A turn's persistence and roadmap refresh run after the player already has
//! the narration. How far that work is guaranteed to finish depends on the
//! host, so the runner states its [`CompletionGuarantee`] explicitly:
//!
//! - [`TrackedTasks`]: tasks finish as long as the host awaits
//!   [`DeferredTasks::drain`] before shutting down
//! - [`DetachedTasks`]: fire-and-forget; tasks die with the runtime
//!
//! Failures are logged and counted, never surfaced to the player.

use async_trait::async_trait;
use futures::future::BoxFuture;
use odyssey_error::OdysseyResult;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::{JoinError, JoinSet};

/// A deferred unit of work.
pub type DeferredTask = BoxFuture<'static, OdysseyResult<()>>;

/// How far deferred work is guaranteed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionGuarantee {
    /// Every task completes once the host awaits `drain`
    UntilDrained,
    /// Tasks may be lost when the process stops
    BestEffort,
}

/// Task outcome counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DrainReport {
    /// Tasks that finished successfully
    pub succeeded: usize,
    /// Tasks that returned an error
    pub failed: usize,
    /// Tasks that panicked or were cancelled
    pub aborted: usize,
}

impl DrainReport {
    /// Total tasks accounted for.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.aborted
    }

    fn merge(&mut self, other: DrainReport) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.aborted += other.aborted;
    }
}

/// Schedules work to run after the caller has been answered.
#[async_trait]
pub trait DeferredTasks: Send + Sync {
    /// Schedule a task. Must be called from within a tokio runtime.
    fn defer(&self, label: &'static str, task: DeferredTask);

    /// The completion guarantee this runner offers.
    fn guarantee(&self) -> CompletionGuarantee;

    /// Wait for scheduled work, as far as the guarantee allows, and report outcomes.
    async fn drain(&self) -> DrainReport;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeeded,
    Failed,
}

async fn run_logged(label: &'static str, task: DeferredTask) -> Outcome {
    match task.await {
        Ok(()) => {
            tracing::debug!(task = label, "Deferred task completed");
            Outcome::Succeeded
        }
        Err(e) => {
            tracing::error!(task = label, error = %e, "Deferred task failed");
            Outcome::Failed
        }
    }
}

fn record(report: &mut DrainReport, result: Result<Outcome, JoinError>) {
    match result {
        Ok(Outcome::Succeeded) => report.succeeded += 1,
        Ok(Outcome::Failed) => report.failed += 1,
        Err(e) => {
            tracing::error!(error = %e, "Deferred task aborted");
            report.aborted += 1;
        }
    }
}

#[derive(Default)]
struct TrackedState {
    running: JoinSet<Outcome>,
    finished: DrainReport,
}

/// Deferred tasks tracked on a [`JoinSet`] until drained.
#[derive(Clone, Default)]
pub struct TrackedTasks {
    state: Arc<Mutex<TrackedState>>,
}

impl std::fmt::Debug for TrackedTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedTasks")
            .field("pending", &self.pending())
            .finish()
    }
}

impl TrackedTasks {
    /// Create an empty runner.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrackedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Tasks scheduled and not yet reaped.
    pub fn pending(&self) -> usize {
        self.lock().running.len()
    }
}

#[async_trait]
impl DeferredTasks for TrackedTasks {
    fn defer(&self, label: &'static str, task: DeferredTask) {
        let mut state = self.lock();
        // Reap finished tasks so the set does not grow without bound
        while let Some(result) = state.running.try_join_next() {
            record(&mut state.finished, result);
        }
        state.running.spawn(run_logged(label, task));
        tracing::trace!(task = label, pending = state.running.len(), "Deferred task scheduled");
    }

    fn guarantee(&self) -> CompletionGuarantee {
        CompletionGuarantee::UntilDrained
    }

    async fn drain(&self) -> DrainReport {
        let mut report = DrainReport::default();
        loop {
            let (mut running, finished) = {
                let mut state = self.lock();
                let running = std::mem::take(&mut state.running);
                let finished = std::mem::take(&mut state.finished);
                (running, finished)
            };
            report.merge(finished);

            if running.is_empty() {
                break;
            }
            while let Some(result) = running.join_next().await {
                record(&mut report, result);
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            aborted = report.aborted,
            "Deferred tasks drained"
        );
        report
    }
}

#[derive(Debug, Default)]
struct DetachedCounters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Fire-and-forget deferred tasks on `tokio::spawn`.
///
/// Nothing waits for these tasks; work still running when the runtime stops
/// is lost.
#[derive(Debug, Clone)]
pub struct DetachedTasks {
    counters: Arc<DetachedCounters>,
}

impl DetachedTasks {
    /// Create the runner, logging that deferred work is best effort.
    pub fn new() -> Self {
        tracing::warn!(
            "Deferred tasks are detached: turn persistence is best effort and may be lost on shutdown"
        );
        Self {
            counters: Arc::new(DetachedCounters::default()),
        }
    }
}

impl Default for DetachedTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeferredTasks for DetachedTasks {
    fn defer(&self, label: &'static str, task: DeferredTask) {
        let counters = Arc::clone(&self.counters);
        tokio::spawn(async move {
            let counter = match run_logged(label, task).await {
                Outcome::Succeeded => &counters.succeeded,
                Outcome::Failed => &counters.failed,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        });
    }

    fn guarantee(&self) -> CompletionGuarantee {
        CompletionGuarantee::BestEffort
    }

    /// Reports tasks finished so far without waiting for the rest.
    async fn drain(&self) -> DrainReport {
        DrainReport {
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            aborted: 0,
        }
    }
}
