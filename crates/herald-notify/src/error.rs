//! Error type for the notification dispatcher.

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Twilio credentials not configured ({0})")]
    NotConfigured(String),

    #[error("invalid WhatsApp address: {0}")]
    InvalidAddress(String),

    #[error("invalid delay_hours value '{0}': must be a non-negative number")]
    InvalidDelay(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("a notifier is already registered")]
    AlreadyRegistered,

    #[error("no notifier registered")]
    NotRegistered,

    #[error("unknown job handler: {0}")]
    UnknownHandler(String),

    #[error("Twilio error (HTTP {status}{}): {message}", code_suffix(.code))]
    Provider {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("job store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyError::Network(format!("request timed out: {e}"))
        } else {
            NotifyError::Network(e.to_string())
        }
    }
}

impl From<sqlx::Error> for NotifyError {
    fn from(e: sqlx::Error) -> Self {
        NotifyError::Store(e.to_string())
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(e: serde_json::Error) -> Self {
        NotifyError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_includes_code_when_present() {
        let err = NotifyError::Provider {
            status: 400,
            code: Some(21211),
            message: "Invalid 'To' Phone Number".into(),
        };
        assert_eq!(
            err.to_string(),
            "Twilio error (HTTP 400, code 21211): Invalid 'To' Phone Number"
        );

        let err = NotifyError::Provider {
            status: 500,
            code: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "Twilio error (HTTP 500): boom");
    }

    #[test]
    fn job_not_found_display() {
        assert_eq!(
            NotifyError::JobNotFound("abc".into()).to_string(),
            "job not found: abc"
        );
    }

    #[test]
    fn json_error_converts_to_serialization() {
        let err: NotifyError = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert!(matches!(err, NotifyError::Serialization(_)));
    }
}
