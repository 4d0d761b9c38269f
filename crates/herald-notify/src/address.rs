//! WhatsApp address normalisation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::NotifyError;

pub const WHATSAPP_PREFIX: &str = "whatsapp:";

static E164_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^whatsapp:\+[1-9][0-9]{5,14}$").unwrap());

/// Bring `raw` to the `whatsapp:+<digits>` form.
///
/// Accepts bare digits, `+`-prefixed numbers and already-prefixed
/// addresses. Idempotent.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let number = trimmed
        .strip_prefix(WHATSAPP_PREFIX)
        .unwrap_or(trimmed)
        .trim();
    let digits = number.strip_prefix('+').unwrap_or(number);
    format!("{WHATSAPP_PREFIX}+{digits}")
}

/// Normalise and check the result is an E.164 WhatsApp address.
pub fn parse(raw: &str) -> Result<String, NotifyError> {
    let address = normalize(raw);
    if E164_RE.is_match(&address) {
        Ok(address)
    } else {
        Err(NotifyError::InvalidAddress(raw.trim().to_string()))
    }
}
