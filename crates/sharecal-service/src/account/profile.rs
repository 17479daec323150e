use diesel_async::AsyncPgConnection;
use serde::{Deserialize, Serialize};

use sharecal_core::util::nullable::nullable;
use sharecal_db::db::query;
use sharecal_db::model::user::{User, UserProfileChangeset};

use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::error::{ServiceError, ServiceResult};

const MAX_NAME_LENGTH: usize = 150;
const MAX_PHONE_LENGTH: usize = 20;

/// The caller's own account.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: User,
    pub has_password: bool,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            has_password: user.has_usable_password(),
            user,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Option<Option<chrono::NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub profile_image_url: Option<Option<String>>,
    pub is_marketing_agreed: Option<bool>,
}

impl UpdateProfileRequest {
    /// ## Errors
    /// Returns `ValidationError` for overlong names or phone numbers.
    pub fn validate(&self) -> ServiceResult<()> {
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if let Some(value) = value
                && value.trim().chars().count() > MAX_NAME_LENGTH
            {
                return Err(ServiceError::invalid(format!(
                    "{field} must be at most {MAX_NAME_LENGTH} characters"
                )));
            }
        }
        if let Some(Some(phone)) = &self.phone_number
            && phone.trim().chars().count() > MAX_PHONE_LENGTH
        {
            return Err(ServiceError::invalid(format!(
                "phone_number must be at most {MAX_PHONE_LENGTH} characters"
            )));
        }
        Ok(())
    }

    fn changeset(&self, now: chrono::DateTime<chrono::Utc>) -> UserProfileChangeset<'_> {
        UserProfileChangeset {
            first_name: self.first_name.as_deref().map(str::trim),
            last_name: self.last_name.as_deref().map(str::trim),
            phone_number: self
                .phone_number
                .as_ref()
                .map(|p| p.as_deref().map(str::trim).filter(|p| !p.is_empty())),
            birth_date: self.birth_date,
            profile_image_url: self.profile_image_url.as_ref().map(Option::as_deref),
            is_marketing_agreed: self.is_marketing_agreed,
            updated_at: Some(now),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: Option<String>,
    pub new_password: String,
    pub new_password2: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordRequest").finish_non_exhaustive()
    }
}

async fn load_user(conn: &mut AsyncPgConnection, user_id: uuid::Uuid) -> ServiceResult<User> {
    query::user::get_user(conn, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))
}

/// ## Errors
/// Returns `NotFound` if the account no longer exists.
#[tracing::instrument(skip(conn))]
pub async fn me(conn: &mut AsyncPgConnection, user_id: uuid::Uuid) -> ServiceResult<ProfileView> {
    load_user(conn, user_id).await.map(ProfileView::from)
}

/// ## Errors
/// Returns `ValidationError` for invalid fields.
#[tracing::instrument(skip(conn, request))]
pub async fn update_profile(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    request: &UpdateProfileRequest,
) -> ServiceResult<ProfileView> {
    request.validate()?;
    let user = query::user::update_profile(conn, user_id, &request.changeset(chrono::Utc::now()))
        .await?;
    Ok(ProfileView::from(user))
}

/// ## Summary
/// Sets a new password. The current password is required when the account has
/// one; social-only accounts may set their first password without it.
///
/// ## Errors
/// Returns `ValidationError` when the old password is missing or the new pair
/// is invalid, and `AuthenticationError` when the old password is wrong.
#[tracing::instrument(skip(conn, request))]
pub async fn change_password(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    request: &ChangePasswordRequest,
) -> ServiceResult<()> {
    let user = load_user(conn, user_id).await?;
    if let Some(current) = user.password_hash.as_deref() {
        let old = request
            .old_password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::invalid("old_password is required"))?;
        verify_password(old, current)?;
    }
    validate_new_password(&request.new_password, &request.new_password2)?;

    let password_hash = hash_password(&request.new_password)?;
    query::user::set_password_hash(conn, user.id, Some(&password_hash)).await?;
    tracing::info!(user_id = %user.id, "Password changed");
    Ok(())
}
