//! Query functions for linked social identities.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::SocialProvider;
use crate::db::schema::social_accounts;
use crate::model::user::social_account::{NewSocialAccount, SocialAccount};

type BoxedQuery<'a, T> =
    social_accounts::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, SocialAccount> {
    social_accounts::table
        .select(SocialAccount::as_select())
        .into_boxed()
}

/// ## Summary
/// Returns a query to find the social accounts linked to a user.
#[must_use]
pub fn by_user<'a>(user_id: uuid::Uuid) -> BoxedQuery<'a, SocialAccount> {
    all()
        .filter(social_accounts::user_id.eq(user_id))
        .order(social_accounts::created_at.asc())
}

/// ## Summary
/// Finds the account for a provider-scoped identity.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_by_identity(
    conn: &mut AsyncPgConnection,
    provider: SocialProvider,
    social_id: &str,
) -> diesel::QueryResult<Option<SocialAccount>> {
    all()
        .filter(social_accounts::provider.eq(provider))
        .filter(social_accounts::social_id.eq(social_id))
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Finds a user's account for one provider.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_for_user(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    provider: SocialProvider,
) -> diesel::QueryResult<Option<SocialAccount>> {
    by_user(user_id)
        .filter(social_accounts::provider.eq(provider))
        .first(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_user(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> diesel::QueryResult<Vec<SocialAccount>> {
    by_user(user_id).get_results(conn).await
}

/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_social_account(
    conn: &mut AsyncPgConnection,
    new_account: &NewSocialAccount<'_>,
) -> diesel::QueryResult<SocialAccount> {
    diesel::insert_into(social_accounts::table)
        .values(new_account)
        .returning(SocialAccount::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Refreshes provider tokens and profile data after a successful login.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn refresh_account(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    access_token: Option<&str>,
    email: Option<&str>,
    extra_data: &serde_json::Value,
) -> diesel::QueryResult<SocialAccount> {
    diesel::update(social_accounts::table.filter(social_accounts::id.eq(id)))
        .set((
            social_accounts::access_token.eq(access_token),
            social_accounts::email.eq(email),
            social_accounts::extra_data.eq(extra_data),
            social_accounts::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(SocialAccount::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_social_account(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(social_accounts::table.filter(social_accounts::id.eq(id)))
        .execute(conn)
        .await
}
