//! Username generation for accounts created without an explicit username.
//!
//! ## Summary
//! The base comes from the email local part, or `user_<8 hex of id>` when no
//! email is known. Collisions are resolved by the caller trying
//! [`candidate`] with increasing counters until one is free.

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Maximum stored username length.
pub const MAX_USERNAME_LENGTH: usize = 30;

/// Derive the base username for a new account.
///
/// Characters outside `[a-z0-9._-]` become `_`; the result is lowercased and
/// truncated so that a `_<n>` suffix still fits.
#[must_use]
pub fn base_username(email: Option<&str>, id: Uuid) -> String {
    let local = email
        .and_then(|e| e.split('@').next())
        .map(sanitize)
        .filter(|s| !s.is_empty());

    match local {
        Some(local) => local,
        None => format!("user_{}", &id.simple().to_string()[..8]),
    }
}

/// Username to try on the `attempt`-th collision. Attempt `0` is the base itself.
#[must_use]
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    let suffix = format!("_{attempt}");
    let keep = MAX_USERNAME_LENGTH.saturating_sub(suffix.len());
    let head: String = base.chars().take(keep).collect();
    format!("{head}{suffix}")
}

/// Validate a username chosen by the user. Returns it lowercased.
///
/// ## Errors
/// Returns `ValidationError` for empty or overlong names and characters
/// outside `[a-z0-9._-]`.
pub fn validate_username(raw: &str) -> CoreResult<String> {
    let name = raw.trim().to_lowercase();
    if name.is_empty() || name.chars().count() > MAX_USERNAME_LENGTH {
        return Err(CoreError::invalid(format!(
            "Username must be 1 to {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(CoreError::ValidationError(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(name)
}

fn sanitize(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_USERNAME_LENGTH - 4)
        .collect()
}
