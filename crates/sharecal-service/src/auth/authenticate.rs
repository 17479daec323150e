//! Bearer access-token authentication.

use sharecal_db::db::query;
use sharecal_db::model::user::User;

use crate::auth::jwt::{TokenIssuer, TokenType};
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Extracts the token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// ## Summary
/// Resolves an access token to an active user.
///
/// ## Errors
/// Returns `AuthenticationError` if the token is invalid or expired, or the user
/// no longer exists or is inactive.
#[tracing::instrument(skip(conn, issuer, token))]
pub async fn authenticate_access_token(
    conn: &mut diesel_async::AsyncPgConnection,
    issuer: &TokenIssuer,
    token: &str,
) -> ServiceResult<User> {
    let claims = issuer.verify(token, TokenType::Access)?;

    let user = query::user::get_user(conn, claims.sub)
        .await?
        .ok_or_else(|| ServiceError::AuthenticationError("User no longer exists".to_string()))?;

    if !user.is_active {
        return Err(ServiceError::AuthenticationError(
            "Account is disabled".to_string(),
        ));
    }

    tracing::debug!(user_id = %user.id, "Authenticated request");
    Ok(user)
}
