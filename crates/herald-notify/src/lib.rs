//! Deferred WhatsApp notifications for Herald.
//!
//! Sends messages through Twilio immediately or at a later time. Deferred
//! sends are persisted in a SQLite job store and fired by an in-process
//! scheduler. Persisted jobs carry only a handler key and plain JSON
//! arguments; the handlers find the live [`Notifier`] through the
//! process-wide [`registry`].

pub mod address;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod messaging;
pub mod registry;
pub mod scheduler;
pub mod store;

pub use dispatcher::{DelayHours, Notifier, ScheduledJob};
pub use error::NotifyError;
pub use job::{Job, MissedRuns, Trigger};
pub use messaging::{MessageSender, SentMessage, TwilioClient, TwilioCredentials};
pub use scheduler::{HandlerTable, JobFn, JobFuture, Scheduler, SchedulerPolicy, TickReport};
pub use store::JobStore;
