pub mod errors;
pub mod id;

pub use errors::{ConfigError, HeraldError};
pub use id::{new_correlation_id, new_id, new_job_id, SessionId};
