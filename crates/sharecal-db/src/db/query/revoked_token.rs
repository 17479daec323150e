//! Query functions for the refresh-token revocation list.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::revoked_tokens;
use crate::model::user::revoked_token::NewRevokedToken;

/// ## Summary
/// Records a token as revoked. Revoking twice is a no-op.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn revoke(
    conn: &mut AsyncPgConnection,
    token: &NewRevokedToken<'_>,
) -> diesel::QueryResult<usize> {
    diesel::insert_into(revoked_tokens::table)
        .values(token)
        .on_conflict(revoked_tokens::jti)
        .do_nothing()
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn is_revoked(conn: &mut AsyncPgConnection, jti: &str) -> diesel::QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        revoked_tokens::table.filter(revoked_tokens::jti.eq(jti)),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Drops entries whose token would have expired anyway.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn purge_expired(
    conn: &mut AsyncPgConnection,
    now: chrono::DateTime<chrono::Utc>,
) -> diesel::QueryResult<usize> {
    diesel::delete(revoked_tokens::table.filter(revoked_tokens::expires_at.lt(now)))
        .execute(conn)
        .await
}
