//! In-process job scheduler over the durable [`JobStore`].
//!
//! A single loop task wakes at the earliest pending fire time (capped by
//! the poll interval, or earlier when a job is added), collects due jobs
//! and hands each run to a worker. Workers are bounded by a semaphore and
//! per-job concurrency by `max_instances`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::error::NotifyError;
use crate::job::Job;
use crate::store::JobStore;

pub type JobFuture = BoxFuture<'static, Result<String, NotifyError>>;

/// A job handler. Must be a free function: jobs persist only its key.
pub type JobFn = fn(Vec<Value>) -> JobFuture;

/// Maps handler keys stored with jobs to the functions that run them.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, JobFn>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, handler: JobFn) -> Self {
        self.handlers.insert(key.to_string(), handler);
        self
    }

    pub fn get(&self, key: &str) -> Option<JobFn> {
        self.handlers.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }
}

/// Execution policy applied to every job.
#[derive(Debug, Clone)]
pub struct SchedulerPolicy {
    pub max_workers: usize,
    pub max_instances: usize,
    /// Collapse a backlog of missed runs into a single run.
    pub coalesce: bool,
    pub misfire_grace: TimeDelta,
    pub poll_interval: Duration,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            max_workers: 10,
            max_instances: 3,
            coalesce: false,
            misfire_grace: TimeDelta::hours(24),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of one pass over the due jobs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub dispatched: usize,
    /// Runs dropped for being later than the misfire grace.
    pub misfired: usize,
    /// Runs dropped because the job already had `max_instances` running.
    pub over_limit: usize,
}

const MIN_SLEEP: Duration = Duration::from_millis(10);

type InstanceCounts = Arc<Mutex<HashMap<String, usize>>>;

/// Releases a job's instance slot when its run finishes.
struct InstanceSlot {
    counts: InstanceCounts,
    job_id: String,
}

impl Drop for InstanceSlot {
    fn drop(&mut self) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(n) = counts.get_mut(&self.job_id) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                counts.remove(&self.job_id);
            }
        }
    }
}

pub struct Scheduler {
    store: JobStore,
    handlers: HandlerTable,
    policy: SchedulerPolicy,
    workers: Arc<Semaphore>,
    running: InstanceCounts,
    wake: Notify,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl Scheduler {
    /// Worker and instance limits below one are raised to one.
    pub fn new(store: JobStore, handlers: HandlerTable, mut policy: SchedulerPolicy) -> Self {
        policy.max_workers = policy.max_workers.max(1);
        policy.max_instances = policy.max_instances.max(1);
        Self {
            store,
            handlers,
            workers: Arc::new(Semaphore::new(policy.max_workers)),
            policy,
            running: Arc::default(),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Persist a job and wake the loop so it can re-plan its sleep.
    pub async fn add_job(&self, job: &Job, replace_existing: bool) -> Result<(), NotifyError> {
        if !self.handlers.contains(&job.handler) {
            return Err(NotifyError::UnknownHandler(job.handler.clone()));
        }
        self.store.add(job, replace_existing).await?;
        debug!(job = %job.id, handler = %job.handler, next_run = %job.next_run_time, "Job added");
        self.wake.notify_one();
        Ok(())
    }

    /// Run every due job once. One-shot jobs are deleted and interval jobs
    /// advanced before their runs are spawned.
    pub async fn run_pending(&self, now: DateTime<Utc>) -> Result<TickReport, NotifyError> {
        let mut report = TickReport::default();

        for job in self.store.due(now).await? {
            let missed = job.missed_runs(now, self.policy.misfire_grace);
            match job.next_after(now) {
                Some(next) => self.store.set_next_run(&job.id, next).await?,
                None => {
                    self.store.remove(&job.id).await?;
                }
            }

            let mut runs = missed.runs;
            if missed.late > 0 {
                warn!(job = %job.id, skipped = missed.late, "Run time of job was missed by more than the grace period");
                report.misfired += missed.late;
            }
            if self.policy.coalesce && runs.len() > 1 {
                runs.drain(..runs.len() - 1);
            }

            let Some(handler) = self.handlers.get(&job.handler) else {
                error!(job = %job.id, error = %NotifyError::UnknownHandler(job.handler.clone()), "Cannot run job");
                continue;
            };

            let mut over_limit = 0;
            for at in runs {
                match self.claim_slot(&job.id) {
                    Some(slot) => {
                        self.spawn_run(handler, &job, at, slot);
                        report.dispatched += 1;
                    }
                    None => over_limit += 1,
                }
            }
            if over_limit > 0 {
                warn!(
                    job = %job.id,
                    skipped = over_limit,
                    max_instances = self.policy.max_instances,
                    "Maximum number of running instances reached, skipping runs"
                );
                report.over_limit += over_limit;
            }
        }

        Ok(report)
    }

    fn claim_slot(&self, job_id: &str) -> Option<InstanceSlot> {
        let mut counts = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        let n = counts.entry(job_id.to_string()).or_insert(0);
        if *n >= self.policy.max_instances {
            return None;
        }
        *n += 1;
        Some(InstanceSlot {
            counts: Arc::clone(&self.running),
            job_id: job_id.to_string(),
        })
    }

    fn spawn_run(&self, handler: JobFn, job: &Job, at: DateTime<Utc>, slot: InstanceSlot) {
        let workers = Arc::clone(&self.workers);
        let job_id = job.id.clone();
        let args = job.args.clone();

        self.tasks.spawn(async move {
            let _slot = slot;
            let Ok(_permit) = workers.acquire_owned().await else {
                return;
            };
            debug!(job = %job_id, scheduled_for = %at, "Running job");
            match handler(args).await {
                Ok(output) => debug!(job = %job_id, %output, "Job executed successfully"),
                Err(e) => error!(job = %job_id, error = %e, "Job raised an error"),
            }
        });
    }

    /// Number of runs of `job_id` currently in flight.
    pub fn running_instances(&self, job_id: &str) -> usize {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .copied()
            .unwrap_or(0)
    }

    /// Wait until every spawned run has finished.
    pub async fn wait_idle(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Drive the scheduler until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: Arc<Self>) {
        info!(
            workers = self.policy.max_workers,
            max_instances = self.policy.max_instances,
            "Scheduler started (UTC)"
        );

        loop {
            let ticked = match self.run_pending(Utc::now()).await {
                Ok(_) => true,
                Err(e) => {
                    error!(error = %e, "Scheduler tick failed");
                    false
                }
            };
            let sleep_for = self.next_sleep(ticked).await;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }

        self.tasks.close();
        self.tasks.wait().await;
        info!("Scheduler stopped");
    }

    /// How long the loop sleeps before the next tick. A failed tick waits a
    /// full poll interval.
    async fn next_sleep(&self, ticked: bool) -> Duration {
        if !ticked {
            return self.policy.poll_interval;
        }
        let now = Utc::now();
        match self.store.next_run_after(now).await {
            Ok(Some(at)) => (at - now)
                .to_std()
                .unwrap_or(MIN_SLEEP)
                .clamp(MIN_SLEEP, self.policy.poll_interval.max(MIN_SLEEP)),
            Ok(None) => self.policy.poll_interval,
            Err(e) => {
                error!(error = %e, "Failed to read next run time");
                self.policy.poll_interval
            }
        }
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
