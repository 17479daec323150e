use thiserror::Error;

/// Errors raised by input normalization and shared invariants.
#[derive(Error, Debug)]
pub enum CoreError {
    /// User-supplied input was rejected; the message is shown to the client.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl CoreError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_))
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
