//! Registration, login and the token lifecycle.

use diesel_async::AsyncPgConnection;
use serde::{Deserialize, Serialize};

use sharecal_core::util::email::require_email;
use sharecal_core::util::username::{base_username, candidate, validate_username};
use sharecal_db::db::enums::LoginMethod;
use sharecal_db::db::query;
use sharecal_db::error::{constraint, is_unique_violation_on};
use sharecal_db::model::user::revoked_token::NewRevokedToken;
use sharecal_db::model::user::{NewUser, User};

use crate::auth::jwt::{TokenIssuer, TokenPair, TokenType};
use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::error::{ServiceError, ServiceResult};

/// Usernames tried before giving up on a generated one.
const USERNAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access: String,
    pub access_expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Email address or username.
    #[serde(alias = "email", alias = "username")]
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    pub refresh: String,
}

/// Maps unique violations on `users` to a `Conflict`.
pub(crate) fn user_conflict(error: diesel::result::Error) -> ServiceError {
    if is_unique_violation_on(&error, constraint::USERS_EMAIL) {
        ServiceError::Conflict("A user with this email already exists".to_string())
    } else if is_unique_violation_on(&error, constraint::USERS_USERNAME) {
        ServiceError::Conflict("A user with this username already exists".to_string())
    } else {
        ServiceError::DieselError(error)
    }
}

/// ## Summary
/// First free username derived from the email local part, or from the user id
/// when there is no email.
///
/// ## Errors
/// Returns `Conflict` when every candidate is taken, or a database error.
pub(crate) async fn unique_username(
    conn: &mut AsyncPgConnection,
    email: Option<&str>,
    user_id: uuid::Uuid,
) -> ServiceResult<String> {
    let base = base_username(email, user_id);
    for attempt in 0..USERNAME_ATTEMPTS {
        let name = candidate(&base, attempt);
        if !query::user::username_exists(conn, &name).await? {
            return Ok(name);
        }
    }
    Err(ServiceError::Conflict(format!(
        "Could not find a free username based on '{base}'"
    )))
}

fn issue_session(issuer: &TokenIssuer, user: User) -> ServiceResult<AuthSession> {
    let tokens = issuer.issue_pair(user.id, chrono::Utc::now())?;
    Ok(AuthSession { user, tokens })
}

/// ## Summary
/// Creates an email/password account and signs it in.
///
/// ## Errors
/// Returns `ValidationError` for a bad email, username or password and
/// `Conflict` when the email or username is taken.
#[tracing::instrument(skip(conn, issuer, request), fields(email = %request.email))]
pub async fn register(
    conn: &mut AsyncPgConnection,
    issuer: &TokenIssuer,
    request: &RegisterRequest,
) -> ServiceResult<AuthSession> {
    let email = require_email(&request.email)?;
    validate_new_password(&request.password, &request.password2)?;
    let requested_username = request
        .username
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .map(validate_username)
        .transpose()?;

    if query::user::email_exists(conn, &email).await? {
        return Err(ServiceError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let id = uuid::Uuid::now_v7();
    let username = match requested_username {
        Some(name) => {
            if query::user::username_exists(conn, &name).await? {
                return Err(ServiceError::Conflict(
                    "A user with this username already exists".to_string(),
                ));
            }
            name
        }
        None => unique_username(conn, Some(&email), id).await?,
    };
    let password_hash = hash_password(&request.password)?;

    let new_user = NewUser {
        id,
        email: Some(&email),
        username: &username,
        password_hash: Some(&password_hash),
        first_name: request.first_name.trim(),
        last_name: request.last_name.trim(),
        profile_image_url: None,
        login_method: LoginMethod::Email,
        is_email_verified: false,
    };
    let user = query::user::create_user(conn, &new_user)
        .await
        .map_err(user_conflict)?;

    tracing::info!(user_id = %user.id, username = %username, "User registered");
    issue_session(issuer, user)
}

/// ## Summary
/// Signs in with an email or username and a password. Email is tried first.
///
/// ## Errors
/// Returns `AuthenticationError` for unknown users, wrong passwords, accounts
/// without a password and disabled accounts.
#[tracing::instrument(skip(conn, issuer, request), fields(login = %request.login))]
pub async fn login(
    conn: &mut AsyncPgConnection,
    issuer: &TokenIssuer,
    request: &LoginRequest,
) -> ServiceResult<AuthSession> {
    let invalid = || ServiceError::AuthenticationError("Invalid credentials".to_string());
    let login = request.login.trim().to_lowercase();
    if login.is_empty() {
        return Err(invalid());
    }

    let user = match query::user::get_user_by_email(conn, &login).await? {
        Some(user) => user,
        None => query::user::get_user_by_username(conn, &login)
            .await?
            .ok_or_else(invalid)?,
    };
    if !user.is_active {
        return Err(ServiceError::AuthenticationError(
            "Account is disabled".to_string(),
        ));
    }
    let Some(password_hash) = user.password_hash.as_deref() else {
        tracing::debug!(user_id = %user.id, "Password login for account without password");
        return Err(invalid());
    };
    verify_password(&request.password, password_hash)?;

    let now = chrono::Utc::now();
    query::user::touch_last_login(conn, user.id, now).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    issue_session(
        issuer,
        User {
            last_login: Some(now),
            ..user
        },
    )
}

/// ## Summary
/// Revokes a refresh token of the calling user.
///
/// ## Errors
/// Returns `AuthenticationError` if the token is invalid or belongs to someone else.
#[tracing::instrument(skip(conn, issuer, refresh_token))]
pub async fn logout(
    conn: &mut AsyncPgConnection,
    issuer: &TokenIssuer,
    user_id: uuid::Uuid,
    refresh_token: &str,
) -> ServiceResult<()> {
    let claims = issuer.verify(refresh_token, TokenType::Refresh)?;
    if claims.sub != user_id {
        return Err(ServiceError::AuthenticationError(
            "Token does not belong to this user".to_string(),
        ));
    }

    let now = chrono::Utc::now();
    query::revoked_token::revoke(
        conn,
        &NewRevokedToken {
            jti: &claims.jti,
            user_id,
            expires_at: claims.expires_at(),
        },
    )
    .await?;
    let purged = query::revoked_token::purge_expired(conn, now).await?;
    tracing::info!(purged, "Refresh token revoked");
    Ok(())
}

/// ## Summary
/// Mints a new access token from a refresh token.
///
/// ## Errors
/// Returns `AuthenticationError` for invalid, expired or revoked tokens and for
/// users that no longer exist or are disabled.
#[tracing::instrument(skip(conn, issuer, refresh_token))]
pub async fn refresh(
    conn: &mut AsyncPgConnection,
    issuer: &TokenIssuer,
    refresh_token: &str,
) -> ServiceResult<AccessToken> {
    let claims = issuer.verify(refresh_token, TokenType::Refresh)?;
    if query::revoked_token::is_revoked(conn, &claims.jti).await? {
        return Err(ServiceError::AuthenticationError(
            "Token has been revoked".to_string(),
        ));
    }
    let user = query::user::get_user(conn, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ServiceError::AuthenticationError("User is not active".to_string()))?;

    let (access, access_expires_at) = issuer.issue_access(user.id, chrono::Utc::now())?;
    Ok(AccessToken {
        access,
        access_expires_at,
    })
}

/// ## Errors
/// Returns `ValidationError` for malformed addresses.
#[tracing::instrument(skip(conn))]
pub async fn check_email(conn: &mut AsyncPgConnection, email: &str) -> ServiceResult<bool> {
    let email = require_email(email)?;
    Ok(query::user::email_exists(conn, &email).await?)
}
