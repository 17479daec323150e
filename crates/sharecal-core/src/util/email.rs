//! Email address normalization.
//!
//! Addresses are stored and compared lower-cased and trimmed. Validation is a
//! plausibility check only; deliverability is the mail relay's concern.

use crate::error::{CoreError, CoreResult};

/// Lower-cased, trimmed address, or `None` when it is not plausibly an email.
#[must_use]
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let plausible = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    plausible.then_some(email)
}

/// ## Errors
/// Returns `ValidationError` when the address is not plausibly an email.
pub fn require_email(raw: &str) -> CoreResult<String> {
    normalize_email(raw)
        .ok_or_else(|| CoreError::invalid(format!("Invalid email address '{}'", raw.trim())))
}
