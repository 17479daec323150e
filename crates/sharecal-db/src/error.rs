use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    CoreError(#[from] sharecal_core::error::CoreError),
}

pub type DbResult<T> = std::result::Result<T, DbError>;

/// Names of the unique constraints declared by the migrations.
pub mod constraint {
    pub const USERS_EMAIL: &str = "users_email_key";
    pub const USERS_USERNAME: &str = "users_username_key";
    pub const SOCIAL_ACCOUNTS_PROVIDER_SOCIAL_ID: &str = "social_accounts_provider_social_id_key";
    pub const CALENDARS_SHARE_TOKEN: &str = "calendars_share_token_key";
    pub const CALENDAR_MEMBERS_CALENDAR_USER: &str = "calendar_members_calendar_id_user_id_key";
    pub const CALENDAR_TAGS_CALENDAR_COLOR: &str = "calendar_tags_calendar_id_color_key";
    pub const CALENDAR_INVITATIONS_PENDING_EMAIL: &str = "calendar_invitations_pending_email_idx";
}

/// ## Summary
/// Returns the violated constraint name when `error` is a unique violation.
#[must_use]
pub fn unique_violation(error: &diesel::result::Error) -> Option<&str> {
    match error {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            info,
        ) => info.constraint_name(),
        _ => None,
    }
}

/// ## Summary
/// True when `error` is a unique violation on the named constraint.
#[must_use]
pub fn is_unique_violation_on(error: &diesel::result::Error, constraint: &str) -> bool {
    unique_violation(error) == Some(constraint)
}

impl DbError {
    /// Name of the violated unique constraint, if this wraps one.
    #[must_use]
    pub fn unique_violation(&self) -> Option<&str> {
        match self {
            Self::DatabaseError(e) => unique_violation(e),
            _ => None,
        }
    }
}
