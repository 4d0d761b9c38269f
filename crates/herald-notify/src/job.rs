//! Persisted job model.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use herald_common::new_job_id;

/// Handler key for deferred WhatsApp sends. Args: `[to, message]`.
pub const SEND_WHATSAPP: &str = "send_whatsapp";
/// Handler key for the liveness heartbeat. No args.
pub const HEARTBEAT: &str = "heartbeat";
/// Fixed id of the heartbeat job.
pub const HEARTBEAT_JOB_ID: &str = "heartbeat_job";

/// When a job fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fires once at `next_run_time`, then is deleted.
    Date,
    /// Fires every `seconds`, starting at `next_run_time`.
    Interval { seconds: u64 },
}

impl Trigger {
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Date => "date",
            Trigger::Interval { .. } => "interval",
        }
    }
}

/// Result of [`Job::missed_runs`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MissedRuns {
    /// Fire times still inside the misfire grace, oldest first.
    pub runs: Vec<DateTime<Utc>>,
    /// Fire times dropped for being later than the grace.
    pub late: usize,
}

/// A durably stored unit of deferred work.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub trigger: Trigger,
    pub next_run_time: DateTime<Utc>,
    pub handler: String,
    pub args: Vec<Value>,
}

impl Job {
    /// One-shot job with a fresh id.
    pub fn once(handler: &str, run_at: DateTime<Utc>, args: Vec<Value>) -> Self {
        Self {
            id: new_job_id(),
            trigger: Trigger::Date,
            next_run_time: run_at,
            handler: handler.to_string(),
            args,
        }
    }

    /// Interval job with a caller-chosen id, first firing at `first_run`.
    pub fn interval(id: &str, handler: &str, seconds: u64, first_run: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            trigger: Trigger::Interval { seconds },
            next_run_time: first_run,
            handler: handler.to_string(),
            args: Vec::new(),
        }
    }

    /// Fire times at or before `now`, oldest first, that are no more than
    /// `grace` late. Older fire times are only counted.
    pub fn missed_runs(&self, now: DateTime<Utc>, grace: TimeDelta) -> MissedRuns {
        if self.next_run_time > now {
            return MissedRuns::default();
        }
        let earliest = now
            .checked_sub_signed(grace)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        match self.trigger {
            Trigger::Date if self.next_run_time < earliest => MissedRuns {
                runs: Vec::new(),
                late: 1,
            },
            Trigger::Date => MissedRuns {
                runs: vec![self.next_run_time],
                late: 0,
            },
            Trigger::Interval { seconds } => {
                let step = interval_step(seconds);
                let step_us = step.num_microseconds().unwrap_or(1_000_000);
                let mut at = self.next_run_time;
                let mut late = 0;

                if at < earliest {
                    let behind = (earliest - at).num_microseconds().unwrap_or(i64::MAX);
                    let skipped = behind / step_us + i64::from(behind % step_us != 0);
                    late = usize::try_from(skipped).unwrap_or(usize::MAX);
                    match at.checked_add_signed(TimeDelta::microseconds(skipped.saturating_mul(step_us))) {
                        Some(first) => at = first,
                        None => return MissedRuns { runs: Vec::new(), late },
                    }
                }

                let mut runs = Vec::new();
                while at <= now {
                    runs.push(at);
                    at += step;
                }
                MissedRuns { runs, late }
            }
        }
    }

    /// First fire time strictly after `now`, or `None` for one-shot jobs.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.trigger {
            Trigger::Date => None,
            Trigger::Interval { seconds } => {
                if self.next_run_time > now {
                    return Some(self.next_run_time);
                }
                let step = interval_step(seconds);
                let behind = (now - self.next_run_time).num_microseconds().unwrap_or(i64::MAX);
                let periods = behind / step.num_microseconds().unwrap_or(1_000_000) + 1;
                let advance = TimeDelta::microseconds(
                    periods.saturating_mul(step.num_microseconds().unwrap_or(1_000_000)),
                );
                self.next_run_time.checked_add_signed(advance)
            }
        }
    }
}

fn interval_step(seconds: u64) -> TimeDelta {
    TimeDelta::seconds(seconds.clamp(1, i32::MAX as u64) as i64)
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trigger = match self.trigger {
            Trigger::Date => "once".to_string(),
            Trigger::Interval { seconds } => format!("every {seconds}s"),
        };
        write!(
            f,
            "{}  next={} UTC  {}  {}  args={}",
            self.id,
            self.next_run_time.format("%Y-%m-%d %H:%M:%S"),
            trigger,
            self.handler,
            Value::Array(self.args.clone())
        )
    }
}
