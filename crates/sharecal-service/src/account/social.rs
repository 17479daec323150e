//! Social login and linked provider accounts.
//!
//! ## Summary
//! A verified provider token resolves to a user in this order: the account
//! already linked to that identity, then a user holding the same email when
//! the provider vouches for it, then a new passwordless user. Resolution and
//! linking run in one transaction, serialized per identity and per email
//! address with advisory locks.

use diesel_async::AsyncPgConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};

use sharecal_core::util::email::normalize_email;
use sharecal_db::db::enums::SocialProvider;
use sharecal_db::db::query;
use sharecal_db::db::transaction::{Committed, with_transaction};
use sharecal_db::error::constraint;
use sharecal_db::model::user::social_account::{NewSocialAccount, SocialAccount};
use sharecal_db::model::user::{NewUser, User};

use super::session::{AuthSession, unique_username, user_conflict};
use crate::auth::jwt::TokenIssuer;
use crate::error::{ServiceError, ServiceResult, conflict_on};
use crate::social::{SocialProfile, SocialVerifiers};

#[derive(Clone, Deserialize)]
pub struct SocialLoginRequest {
    pub provider: SocialProvider,
    #[serde(alias = "token")]
    pub access_token: String,
}

impl std::fmt::Debug for SocialLoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialLoginRequest")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialSession {
    #[serde(flatten)]
    pub session: AuthSession,
    pub is_new_user: bool,
}

/// ## Summary
/// A provider link may be removed only if the user can still sign in
/// afterwards, either with a password or through another provider.
///
/// ## Errors
/// Returns `LastLoginMethod` otherwise.
pub fn check_can_disconnect(has_usable_password: bool, linked_accounts: usize) -> ServiceResult<()> {
    if has_usable_password || linked_accounts > 1 {
        Ok(())
    } else {
        Err(ServiceError::LastLoginMethod)
    }
}

async fn link_account(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    provider: SocialProvider,
    profile: &SocialProfile,
    access_token: &str,
) -> ServiceResult<SocialAccount> {
    let email = profile.email.as_deref().and_then(normalize_email);
    let new_account = NewSocialAccount {
        id: uuid::Uuid::now_v7(),
        user_id,
        provider,
        social_id: &profile.social_id,
        email: email.as_deref(),
        access_token: Some(access_token),
        extra_data: &profile.extra,
    };
    query::social_account::create_social_account(conn, &new_account)
        .await
        .map_err(conflict_on(constraint::SOCIAL_ACCOUNTS_PROVIDER_SOCIAL_ID, || {
            ServiceError::Conflict(format!("This {provider} account is already linked"))
        }))
}

async fn create_social_user(
    conn: &mut AsyncPgConnection,
    provider: SocialProvider,
    profile: &SocialProfile,
    email: Option<String>,
) -> ServiceResult<User> {
    let id = uuid::Uuid::now_v7();
    // Only keep the address if nobody else has claimed it.
    let stored_email = match email {
        Some(email) if !query::user::email_exists(conn, &email).await? => Some(email),
        _ => None,
    };
    let username = unique_username(conn, profile.email.as_deref(), id).await?;

    let new_user = NewUser {
        id,
        email: stored_email.as_deref(),
        username: &username,
        password_hash: None,
        first_name: profile.first_name.trim(),
        last_name: profile.last_name.trim(),
        profile_image_url: profile.avatar_url.as_deref(),
        login_method: provider.into(),
        is_email_verified: stored_email.is_some() && profile.email_verified,
    };
    let user = query::user::create_user(conn, &new_user)
        .await
        .map_err(user_conflict)?;
    tracing::info!(user_id = %user.id, %provider, "User created from social login");
    Ok(user)
}

async fn resolve_identity(
    conn: &mut AsyncPgConnection,
    provider: SocialProvider,
    profile: &SocialProfile,
    access_token: &str,
) -> ServiceResult<(User, bool)> {
    let email = profile.email.as_deref().and_then(normalize_email);

    // Concurrent first logins for one identity, or for one address, queue up
    // here so the later ones find the row the first one created.
    query::lock::advisory_xact_lock(conn, &format!("social:{provider}:{}", profile.social_id))
        .await?;
    if let Some(address) = email.as_deref() {
        query::lock::advisory_xact_lock(conn, &format!("email:{address}")).await?;
    }

    if let Some(account) =
        query::social_account::find_by_identity(conn, provider, &profile.social_id).await?
    {
        query::social_account::refresh_account(
            conn,
            account.id,
            Some(access_token),
            email.as_deref(),
            &profile.extra,
        )
        .await?;
        let user = query::user::get_user(conn, account.user_id)
            .await?
            .ok_or(ServiceError::InvariantViolation(
                "social account without user",
            ))?;
        return Ok((user, false));
    }

    if profile.email_verified
        && let Some(address) = email.as_deref()
        && let Some(user) = query::user::get_user_by_email(conn, address).await?
    {
        if query::social_account::find_for_user(conn, user.id, provider)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "This user is already linked to a different {provider} account"
            )));
        }
        if !user.is_email_verified {
            query::user::mark_email_verified(conn, user.id).await?;
        }
        link_account(conn, user.id, provider, profile, access_token).await?;
        tracing::info!(user_id = %user.id, %provider, "Social account linked by email");
        return Ok((
            User {
                is_email_verified: true,
                ..user
            },
            false,
        ));
    }

    let user = create_social_user(conn, provider, profile, email).await?;
    link_account(conn, user.id, provider, profile, access_token).await?;
    Ok((user, true))
}

/// ## Summary
/// Signs in with a provider access token, creating or linking the account as
/// needed.
///
/// ## Errors
/// Returns `ValidationError` for disabled providers, `AuthenticationError`
/// when the provider rejects the token or the account is disabled, and
/// `Conflict` when the identity clashes with an existing link.
#[tracing::instrument(skip(conn, verifiers, issuer, request), fields(provider = %request.provider))]
pub async fn social_login(
    conn: &mut AsyncPgConnection,
    verifiers: &SocialVerifiers,
    issuer: &TokenIssuer,
    request: &SocialLoginRequest,
) -> ServiceResult<SocialSession> {
    let provider = request.provider;
    let token = request.access_token.trim();
    if token.is_empty() {
        return Err(ServiceError::invalid("access_token is required"));
    }
    let profile = verifiers.get(provider)?.verify(token).await?;
    if profile.social_id.is_empty() {
        return Err(ServiceError::AuthenticationError(format!(
            "Invalid {provider} token"
        )));
    }

    let profile = &profile;
    let (user, is_new_user) = with_transaction(conn, |tx| {
        async move {
            let resolved = resolve_identity(tx, provider, profile, token).await?;
            Ok::<_, ServiceError>(Committed::new(resolved))
        }
        .scope_boxed()
    })
    .await?;

    if !user.is_active {
        return Err(ServiceError::AuthenticationError(
            "Account is disabled".to_string(),
        ));
    }
    let now = chrono::Utc::now();
    query::user::touch_last_login(conn, user.id, now).await?;
    let tokens = issuer.issue_pair(user.id, now)?;

    tracing::info!(user_id = %user.id, is_new_user, "Social login succeeded");
    Ok(SocialSession {
        session: AuthSession {
            user: User {
                last_login: Some(now),
                ..user
            },
            tokens,
        },
        is_new_user,
    })
}

/// ## Errors
/// Returns a database error if the query fails.
#[tracing::instrument(skip(conn))]
pub async fn list_social_accounts(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> ServiceResult<Vec<SocialAccount>> {
    Ok(query::social_account::list_for_user(conn, user_id).await?)
}

/// ## Summary
/// Unlinks a provider. The user row is locked so two concurrent disconnects
/// cannot both pass the last-login-method check.
///
/// ## Errors
/// Returns `NotFound` if the provider is not linked and `LastLoginMethod` if
/// it is the only way left to sign in.
#[tracing::instrument(skip(conn))]
pub async fn disconnect_social_account(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    provider: SocialProvider,
) -> ServiceResult<()> {
    with_transaction(conn, |tx| {
        async move {
            let user = query::user::lock_user(tx, user_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("User not found"))?;
            let accounts = query::social_account::list_for_user(tx, user_id).await?;
            let target = accounts
                .iter()
                .find(|a| a.provider == provider)
                .ok_or_else(|| ServiceError::not_found(format!("No linked {provider} account")))?;
            check_can_disconnect(user.has_usable_password(), accounts.len())?;

            query::social_account::delete_social_account(tx, target.id).await?;
            tracing::info!(%user_id, %provider, "Social account disconnected");
            Ok(Committed::new(()))
        }
        .scope_boxed()
    })
    .await
}
