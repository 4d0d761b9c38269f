//! Outbound WhatsApp delivery through the Twilio Messages API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

use crate::address;
use crate::error::NotifyError;

pub const TWILIO_ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
pub const TWILIO_AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";
pub const TWILIO_WHATSAPP_FROM_ENV: &str = "TWILIO_WHATSAPP_FROM";

pub(crate) const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Anything that can deliver a WhatsApp message to a normalised address.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage, NotifyError>;
}

/// Provider receipt for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentMessage {
    pub sid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub to: String,
}

impl fmt::Display for SentMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "📩 WhatsApp (Twilio) sent: sid={}, to={}", self.sid, self.to)
    }
}

/// Twilio account credentials and the sending address.
#[derive(Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

impl TwilioCredentials {
    /// Read credentials from the process environment.
    ///
    /// Returns `None` unless all three variables are set and non-blank.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Some(Self {
            account_sid: get(TWILIO_ACCOUNT_SID_ENV)?,
            auth_token: get(TWILIO_AUTH_TOKEN_ENV)?,
            from: get(TWILIO_WHATSAPP_FROM_ENV)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Twilio REST client. Construction succeeds without credentials; sends
/// then fail with [`NotifyError::NotConfigured`].
pub struct TwilioClient {
    credentials: Option<TwilioCredentials>,
    api_base: String,
    http: reqwest::Client,
}

impl TwilioClient {
    pub fn new(
        credentials: Option<TwilioCredentials>,
        api_base: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            credentials,
            api_base: api_base
                .unwrap_or(TWILIO_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    pub(crate) fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, account_sid
        )
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<SentMessage, NotifyError> {
        let Some(creds) = &self.credentials else {
            error!("Twilio credentials missing");
            return Err(NotifyError::NotConfigured(format!(
                "{TWILIO_ACCOUNT_SID_ENV}/{TWILIO_AUTH_TOKEN_ENV}/{TWILIO_WHATSAPP_FROM_ENV}"
            )));
        };

        let from = address::normalize(&creds.from);
        let to = address::normalize(to);
        info!(%from, %to, "Sending via Twilio");

        let response = self
            .http
            .post(self.messages_url(&creds.account_sid))
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&[("From", from.as_str()), ("To", to.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let err = provider_error(status.as_u16(), &text);
            error!(error = %err, "Twilio send error");
            return Err(err);
        }

        let sent: SentMessage = serde_json::from_str(&text)?;
        info!(sid = %sent.sid, status = %sent.status, to = %sent.to, "Twilio created message");
        Ok(sent)
    }
}

fn provider_error(status: u16, body: &str) -> NotifyError {
    match serde_json::from_str::<TwilioErrorBody>(body) {
        Ok(parsed) => NotifyError::Provider {
            status,
            code: parsed.code,
            message: parsed.message.unwrap_or_else(|| body.to_string()),
        },
        Err(_) => NotifyError::Provider {
            status,
            code: None,
            message: body.to_string(),
        },
    }
}
