//! Validation for the notify and scheduler sections.

use crate::schema::HeraldConfig;

use super::helpers::{validate_http_url, validate_range, validate_range_u64};

/// Validate messaging and job-store settings.
pub(crate) fn validate_notify(errors: &mut Vec<String>, config: &HeraldConfig) {
    if !config.notify.database_url.starts_with("sqlite:") {
        errors.push(format!(
            "notify.database_url = {:?} must be a sqlite: URL",
            config.notify.database_url
        ));
    }
    validate_range(
        errors,
        "notify.send_timeout_secs",
        config.notify.send_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "notify.heartbeat_secs",
        config.notify.heartbeat_secs,
        5,
        3600,
    );
    validate_http_url(errors, "notify.twilio_api_base", &config.notify.twilio_api_base);
}

/// Validate scheduler policy.
pub(crate) fn validate_scheduler(errors: &mut Vec<String>, config: &HeraldConfig) {
    validate_range(
        errors,
        "scheduler.max_workers",
        config.scheduler.max_workers,
        1,
        64,
    );
    validate_range(
        errors,
        "scheduler.max_instances",
        config.scheduler.max_instances,
        1,
        16,
    );
    validate_range_u64(
        errors,
        "scheduler.poll_interval_ms",
        config.scheduler.poll_interval_ms,
        50,
        60_000,
    );
}
