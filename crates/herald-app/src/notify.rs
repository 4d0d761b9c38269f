//! `herald notify ...` subcommands.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use herald_common::HeraldError;
use herald_config::schema::{NotifyConfig, SchedulerConfig};
use herald_config::HeraldConfig;
use herald_notify::{
    DelayHours, JobStore, Notifier, NotifyError, SchedulerPolicy, TwilioClient, TwilioCredentials,
};

use crate::cli::NotifyCommand;

fn policy_from(config: &SchedulerConfig) -> SchedulerPolicy {
    SchedulerPolicy {
        max_workers: config.max_workers as usize,
        max_instances: config.max_instances as usize,
        coalesce: config.coalesce,
        misfire_grace: TimeDelta::seconds(config.misfire_grace_secs.min(i64::MAX as u64 / 1000) as i64),
        poll_interval: Duration::from_millis(config.poll_interval_ms),
    }
}

async fn build_notifier(config: &HeraldConfig) -> Result<Notifier, NotifyError> {
    let notify: &NotifyConfig = &config.notify;

    let credentials = TwilioCredentials::from_env();
    if credentials.is_none() {
        tracing::warn!("Twilio credentials missing; sends will fail until they are set");
    }
    let sender = TwilioClient::new(
        credentials,
        Some(&notify.twilio_api_base),
        Duration::from_secs(u64::from(notify.send_timeout_secs)),
    )?;
    let store = JobStore::connect(&notify.database_url).await?;

    Ok(Notifier::new(Arc::new(sender), store, policy_from(&config.scheduler))
        .with_heartbeat_secs(u64::from(notify.heartbeat_secs)))
}

async fn execute(config: &HeraldConfig, command: NotifyCommand) -> Result<(), NotifyError> {
    let notifier = build_notifier(config).await?;

    match command {
        NotifyCommand::Send { to, message } => {
            let sent = notifier.send_now(&to, &message).await?;
            println!("{sent}");
        }
        NotifyCommand::Schedule {
            to,
            message,
            delay_hours,
        } => {
            let delay: DelayHours = delay_hours.parse()?;
            let scheduled = notifier.schedule(&to, &message, delay.hours()).await?;
            println!("{scheduled}");
            println!("Run `herald notify serve` to deliver it when due.");
        }
        NotifyCommand::Jobs => {
            let jobs = notifier.list_jobs().await?;
            if jobs.is_empty() {
                println!("No pending jobs.");
            }
            for job in jobs {
                println!("{job}");
            }
        }
        NotifyCommand::Cancel { id } => {
            notifier.cancel(&id).await?;
            println!("✅ Removed job {id}");
        }
        NotifyCommand::Serve => {
            let notifier = notifier.install().await?;
            println!("📡 Dispatcher running. Press Ctrl-C to stop.");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {e}");
            }
            notifier.shutdown();
            // Let in-flight sends finish.
            notifier.scheduler().wait_idle().await;
            println!("Dispatcher stopped.");
        }
    }
    Ok(())
}

pub async fn run(config: &HeraldConfig, command: NotifyCommand) -> Result<(), HeraldError> {
    execute(config, command)
        .await
        .map_err(|e| HeraldError::Notify(e.to_string()))
}
