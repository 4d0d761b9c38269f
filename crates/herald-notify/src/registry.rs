//! Process-wide handle to the installed [`Notifier`].
//!
//! Persisted jobs reference their handler by key only. The free functions
//! here are what those keys resolve to; they look up the live notifier at
//! fire time. The slot is written once.

use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tracing::{info, warn};

use crate::dispatcher::Notifier;
use crate::error::NotifyError;
use crate::job::{HEARTBEAT, SEND_WHATSAPP};
use crate::scheduler::{HandlerTable, JobFuture};

static NOTIFIER: OnceLock<Arc<Notifier>> = OnceLock::new();

/// Install `notifier` as the process-wide instance.
pub fn register(notifier: Arc<Notifier>) -> Result<(), NotifyError> {
    NOTIFIER
        .set(notifier)
        .map_err(|_| NotifyError::AlreadyRegistered)?;
    info!("Notifier instance registered");
    Ok(())
}

pub fn instance() -> Result<Arc<Notifier>, NotifyError> {
    NOTIFIER.get().cloned().ok_or(NotifyError::NotRegistered)
}

/// Handler table with every built-in job function.
pub fn default_handlers() -> HandlerTable {
    HandlerTable::new()
        .with(SEND_WHATSAPP, run_scheduled)
        .with(HEARTBEAT, heartbeat_runner)
}

/// Deferred send. Args: `[to, message]`.
pub fn run_scheduled(args: Vec<Value>) -> JobFuture {
    Box::pin(async move {
        let [Value::String(to), Value::String(message)] = args.as_slice() else {
            return Err(NotifyError::Serialization(format!(
                "{SEND_WHATSAPP} expects [to, message], got {args:?}"
            )));
        };
        let notifier = instance().inspect_err(|_| {
            warn!(%to, "No notifier registered; cannot run scheduled send");
        })?;
        info!(%to, "Running scheduled WhatsApp send");
        let sent = notifier.send_now(to, message).await?;
        Ok(sent.to_string())
    })
}

pub fn heartbeat_runner(_args: Vec<Value>) -> JobFuture {
    Box::pin(async {
        match instance() {
            Ok(notifier) => {
                notifier.heartbeat();
                Ok("alive".to_string())
            }
            Err(e) => {
                warn!("Heartbeat runner: no notifier registered");
                Err(e)
            }
        }
    })
}
