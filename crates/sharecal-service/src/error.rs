use serde::Serialize;
use thiserror::Error;

use sharecal_db::db::enums::InvitationStatus;
use sharecal_db::error::is_unique_violation_on;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    DatabaseError(#[from] sharecal_db::error::DbError),

    #[error(transparent)]
    CoreError(#[from] sharecal_core::error::CoreError),

    #[error("Diesel error: {0}")]
    DieselError(#[from] diesel::result::Error),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("A pending invitation already exists for {0}")]
    DuplicateInvitation(String),

    #[error("Invitation has expired")]
    InvitationExpired,

    #[error("Invitation was already {0}")]
    InvitationAlreadyResolved(InvitationStatus),

    #[error("Share link is invalid or has been regenerated")]
    InvalidShareToken,

    #[error("You already own this calendar")]
    AlreadyOwner,

    #[error("Already a member of this calendar")]
    AlreadyMember,

    #[error("The owner cannot leave their own calendar")]
    OwnerCannotLeave,

    #[error("A tag with color {0} already exists in this calendar")]
    DuplicateTagColor(String),

    #[error("Tag does not belong to this calendar")]
    InvalidTagReference,

    #[error("Cannot remove the last login method")]
    LastLoginMethod,

    #[error("Email delivery failed: {0}")]
    DeliveryError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Client-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    State,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Authentication => "authentication_error",
            Self::Authorization => "authorization_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::State => "state_error",
            Self::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceError {
    /// ## Summary
    /// Classifies the error for the API boundary.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) | Self::InvalidTagReference => ErrorKind::Validation,
            Self::NotAuthenticated | Self::AuthenticationError(_) => ErrorKind::Authentication,
            Self::AuthorizationError(_) => ErrorKind::Authorization,
            Self::NotFound(_) | Self::InvalidShareToken => ErrorKind::NotFound,
            Self::Conflict(_)
            | Self::DuplicateInvitation(_)
            | Self::AlreadyOwner
            | Self::AlreadyMember
            | Self::DuplicateTagColor(_) => ErrorKind::Conflict,
            Self::InvitationExpired
            | Self::InvitationAlreadyResolved(_)
            | Self::OwnerCannotLeave
            | Self::LastLoginMethod => ErrorKind::State,
            Self::DieselError(e) if sharecal_db::error::unique_violation(e).is_some() => {
                ErrorKind::Conflict
            }
            Self::DatabaseError(e) if e.unique_violation().is_some() => ErrorKind::Conflict,
            Self::CoreError(sharecal_core::error::CoreError::ValidationError(_)) => {
                ErrorKind::Validation
            }
            Self::DatabaseError(_)
            | Self::CoreError(_)
            | Self::DieselError(_)
            | Self::DeliveryError(_)
            | Self::InvalidConfiguration(_)
            | Self::InvariantViolation(_) => ErrorKind::Internal,
        }
    }

    /// ## Summary
    /// Message safe to show to clients. Internal details are hidden.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            ErrorKind::Conflict if matches!(self, Self::DieselError(_) | Self::DatabaseError(_)) => {
                "Resource already exists".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Shorthand for an authorization failure.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::AuthorizationError(message.into())
    }

    /// Shorthand for a missing entity.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Shorthand for invalid input.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

/// ## Summary
/// Builds an error mapper that turns a unique violation on `constraint` into the
/// error produced by `make`, passing every other database error through.
pub fn conflict_on<F>(
    constraint: &'static str,
    make: F,
) -> impl FnOnce(diesel::result::Error) -> ServiceError
where
    F: FnOnce() -> ServiceError,
{
    move |error| {
        if is_unique_violation_on(&error, constraint) {
            make()
        } else {
            ServiceError::DieselError(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_kinds() {
        assert_eq!(ServiceError::invalid("x").kind(), ErrorKind::Validation);
        assert_eq!(ServiceError::NotAuthenticated.kind(), ErrorKind::Authentication);
        assert_eq!(ServiceError::forbidden("x").kind(), ErrorKind::Authorization);
        assert_eq!(ServiceError::InvalidShareToken.kind(), ErrorKind::NotFound);
        assert_eq!(
            ServiceError::DuplicateInvitation("a@b.c".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ServiceError::AlreadyMember.kind(), ErrorKind::Conflict);
        assert_eq!(
            ServiceError::DuplicateTagColor("#FF6B6B".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ServiceError::InvitationExpired.kind(), ErrorKind::State);
        assert_eq!(
            ServiceError::InvitationAlreadyResolved(InvitationStatus::Declined).kind(),
            ErrorKind::State
        );
        assert_eq!(ServiceError::LastLoginMethod.kind(), ErrorKind::State);
        assert_eq!(ServiceError::InvalidTagReference.kind(), ErrorKind::Validation);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ServiceError::InvalidConfiguration("secret path /etc/x".into());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn not_found_diesel_error_is_internal() {
        let err = ServiceError::DieselError(diesel::result::Error::NotFound);
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn conflict_on_passes_through_other_errors() {
        let map = conflict_on("calendar_tags_calendar_id_color_key", || {
            ServiceError::DuplicateTagColor("#000000".into())
        });
        let err = map(diesel::result::Error::NotFound);
        assert!(matches!(err, ServiceError::DieselError(_)));
    }

    #[test]
    fn resolved_message_names_status() {
        let err = ServiceError::InvitationAlreadyResolved(InvitationStatus::Accepted);
        assert_eq!(err.to_string(), "Invitation was already accepted");
    }
}
