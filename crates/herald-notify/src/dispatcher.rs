//! The notification dispatcher: immediate and deferred WhatsApp sends.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::info;

use crate::address;
use crate::error::NotifyError;
use crate::job::{Job, HEARTBEAT, HEARTBEAT_JOB_ID, SEND_WHATSAPP};
use crate::messaging::{MessageSender, SentMessage};
use crate::registry;
use crate::scheduler::{HandlerTable, Scheduler, SchedulerPolicy};
use crate::store::JobStore;

/// Default heartbeat period in seconds.
pub const DEFAULT_HEARTBEAT_SECS: u64 = 30;

/// Upper bound on a delay, roughly a century.
const MAX_DELAY_HOURS: f64 = 876_000.0;

/// A validated, non-negative delay in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayHours(f64);

impl DelayHours {
    pub fn new(hours: f64) -> Result<Self, NotifyError> {
        if !hours.is_finite() || !(0.0..=MAX_DELAY_HOURS).contains(&hours) {
            return Err(NotifyError::InvalidDelay(hours.to_string()));
        }
        Ok(Self(hours))
    }

    pub fn hours(self) -> f64 {
        self.0
    }

    pub fn as_time_delta(self) -> TimeDelta {
        TimeDelta::microseconds((self.0 * 3_600_000_000.0).round() as i64)
    }
}

impl FromStr for DelayHours {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hours: f64 = s
            .trim()
            .parse()
            .map_err(|_| NotifyError::InvalidDelay(s.trim().to_string()))?;
        Self::new(hours)
    }
}

/// Receipt for a deferred send.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledJob {
    pub job_id: String,
    pub run_at: DateTime<Utc>,
    pub to: String,
}

impl fmt::Display for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "⏳ Scheduled WhatsApp message (job_id={}) for {} UTC",
            self.job_id,
            self.run_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Sends WhatsApp messages now or later.
pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    scheduler: Arc<Scheduler>,
    heartbeat_secs: u64,
}

impl Notifier {
    /// A notifier with the built-in job handlers. Nothing runs until
    /// [`install`](Self::install) is called.
    pub fn new(sender: Arc<dyn MessageSender>, store: JobStore, policy: SchedulerPolicy) -> Self {
        Self::with_handlers(sender, store, policy, registry::default_handlers())
    }

    pub fn with_handlers(
        sender: Arc<dyn MessageSender>,
        store: JobStore,
        policy: SchedulerPolicy,
        handlers: HandlerTable,
    ) -> Self {
        Self {
            sender,
            scheduler: Arc::new(Scheduler::new(store, handlers, policy)),
            heartbeat_secs: DEFAULT_HEARTBEAT_SECS,
        }
    }

    pub fn with_heartbeat_secs(mut self, secs: u64) -> Self {
        self.heartbeat_secs = secs.max(1);
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Send `message` to `to` immediately.
    pub async fn send_now(&self, to: &str, message: &str) -> Result<SentMessage, NotifyError> {
        let to = address::parse(to)?;
        self.sender.send(&to, message).await
    }

    /// Persist a one-shot send `delay_hours` from now.
    pub async fn schedule(
        &self,
        to: &str,
        message: &str,
        delay_hours: f64,
    ) -> Result<ScheduledJob, NotifyError> {
        let delay = DelayHours::new(delay_hours)?;
        let to = address::parse(to)?;
        let run_at = Utc::now()
            .checked_add_signed(delay.as_time_delta())
            .ok_or_else(|| NotifyError::InvalidDelay(delay_hours.to_string()))?;

        let job = Job::once(
            SEND_WHATSAPP,
            run_at,
            vec![Value::from(to.as_str()), Value::from(message)],
        );
        self.scheduler.add_job(&job, false).await?;
        info!(job_id = %job.id, run_at = %run_at.to_rfc3339(), %to, "Scheduled WhatsApp job");

        Ok(ScheduledJob {
            job_id: job.id,
            run_at,
            to,
        })
    }

    /// Snapshot of pending jobs ordered by next run time.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, NotifyError> {
        self.scheduler.store().list().await
    }

    pub async fn cancel(&self, job_id: &str) -> Result<(), NotifyError> {
        if self.scheduler.store().remove(job_id).await? {
            info!(%job_id, "Removed job");
            Ok(())
        } else {
            Err(NotifyError::JobNotFound(job_id.to_string()))
        }
    }

    /// Register this notifier process-wide, schedule the heartbeat and
    /// start the scheduler loop on the current runtime.
    pub async fn install(self) -> Result<Arc<Self>, NotifyError> {
        let notifier = Arc::new(self);
        registry::register(Arc::clone(&notifier))?;

        let every = notifier.heartbeat_secs;
        let first_run = Utc::now() + TimeDelta::seconds(every.min(i32::MAX as u64) as i64);
        let heartbeat = Job::interval(HEARTBEAT_JOB_ID, HEARTBEAT, every, first_run);
        notifier.scheduler.add_job(&heartbeat, true).await?;
        info!(every_secs = every, "Heartbeat job scheduled");

        tokio::spawn(Arc::clone(&notifier.scheduler).run());
        Ok(notifier)
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    pub(crate) fn heartbeat(&self) {
        info!(
            "💓 Heartbeat: scheduler is alive at {} UTC",
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f")
        );
    }
}
