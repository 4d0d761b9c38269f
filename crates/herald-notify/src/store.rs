//! SQLite-backed job store.
//!
//! The `jobs` table is the source of truth for pending work. Fire times
//! are stored as UTC epoch microseconds so ordering happens in SQL.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, warn};

use crate::error::NotifyError;
use crate::job::{Job, Trigger};

const SELECT_COLUMNS: &str = "SELECT id, trigger_kind, interval_secs, next_run_at, handler, args FROM jobs";

#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Open (creating if needed) the store at `database_url`.
    ///
    /// Uses WAL journal mode and a 5-second busy timeout.
    pub async fn connect(database_url: &str) -> Result<Self, NotifyError> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        debug!(%database_url, "Job store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), NotifyError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS jobs (
                id            TEXT PRIMARY KEY NOT NULL,
                trigger_kind  TEXT NOT NULL,
                interval_secs INTEGER,
                next_run_at   INTEGER NOT NULL,
                handler       TEXT NOT NULL,
                args          TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_next_run_at ON jobs (next_run_at)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a job. With `replace_existing` an existing id is overwritten,
    /// otherwise a duplicate id is an error.
    pub async fn add(&self, job: &Job, replace_existing: bool) -> Result<(), NotifyError> {
        let sql = if replace_existing {
            "INSERT OR REPLACE INTO jobs (id, trigger_kind, interval_secs, next_run_at, handler, args) VALUES (?, ?, ?, ?, ?, ?)"
        } else {
            "INSERT INTO jobs (id, trigger_kind, interval_secs, next_run_at, handler, args) VALUES (?, ?, ?, ?, ?, ?)"
        };
        let interval_secs = match job.trigger {
            Trigger::Date => None,
            Trigger::Interval { seconds } => Some(i64::try_from(seconds).unwrap_or(i64::MAX)),
        };

        sqlx::query(sql)
            .bind(&job.id)
            .bind(job.trigger.kind())
            .bind(interval_secs)
            .bind(to_micros(job.next_run_time))
            .bind(&job.handler)
            .bind(serde_json::to_string(&job.args)?)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation());
                if duplicate {
                    NotifyError::Store(format!("job {} already exists", job.id))
                } else {
                    NotifyError::from(e)
                }
            })?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn get(&self, id: &str) -> Result<Option<Job>, NotifyError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_job).transpose()
    }

    /// All jobs ordered by next run time. Rows that fail to decode are
    /// logged and skipped.
    pub async fn list(&self) -> Result<Vec<Job>, NotifyError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} ORDER BY next_run_at, id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(decode_rows(&rows))
    }

    /// Jobs whose next run time is at or before `now`. Rows that fail to
    /// decode are logged and skipped.
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Job>, NotifyError> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE next_run_at <= ? ORDER BY next_run_at, id"
        ))
        .bind(to_micros(now))
        .fetch_all(&self.pool)
        .await?;
        Ok(decode_rows(&rows))
    }

    /// Remove a job. Returns whether a row was deleted.
    pub async fn remove(&self, id: &str) -> Result<bool, NotifyError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_next_run(&self, id: &str, at: DateTime<Utc>) -> Result<(), NotifyError> {
        sqlx::query("UPDATE jobs SET next_run_at = ? WHERE id = ?")
            .bind(to_micros(at))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Earliest fire time strictly after `now`, if any.
    ///
    /// Rows still at or before `now` after a tick could not be run, so they
    /// are not allowed to pull the next wake-up into the past.
    pub async fn next_run_after(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, NotifyError> {
        let micros: Option<i64> =
            sqlx::query_scalar("SELECT MIN(next_run_at) FROM jobs WHERE next_run_at > ?")
                .bind(to_micros(now))
                .fetch_one(&self.pool)
                .await?;
        Ok(micros.and_then(DateTime::from_timestamp_micros))
    }
}

fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn decode_rows(rows: &[SqliteRow]) -> Vec<Job> {
    rows.iter()
        .filter_map(|row| match row_to_job(row) {
            Ok(job) => Some(job),
            Err(e) => {
                let id: String = row.try_get("id").unwrap_or_default();
                warn!(job = %id, error = %e, "Skipping job row that cannot be decoded");
                None
            }
        })
        .collect()
}

fn row_to_job(row: &SqliteRow) -> Result<Job, NotifyError> {
    let id: String = row.try_get("id")?;
    let kind: String = row.try_get("trigger_kind")?;
    let interval_secs: Option<i64> = row.try_get("interval_secs")?;
    let next_run_at: i64 = row.try_get("next_run_at")?;
    let handler: String = row.try_get("handler")?;
    let args: String = row.try_get("args")?;

    let trigger = match (kind.as_str(), interval_secs) {
        ("date", _) => Trigger::Date,
        ("interval", Some(secs)) => Trigger::Interval {
            seconds: u64::try_from(secs).unwrap_or(1),
        },
        _ => {
            return Err(NotifyError::Store(format!(
                "job {id} has invalid trigger '{kind}'"
            )))
        }
    };
    let next_run_time = DateTime::from_timestamp_micros(next_run_at)
        .ok_or_else(|| NotifyError::Store(format!("job {id} has invalid next_run_at")))?;

    Ok(Job {
        id,
        trigger,
        next_run_time,
        handler,
        args: serde_json::from_str(&args)?,
    })
}
