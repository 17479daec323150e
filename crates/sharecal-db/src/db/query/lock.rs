//! Transaction-scoped advisory locks.

use diesel::sql_types::Text;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

/// ## Summary
/// Blocks until no other transaction holds the advisory lock for `key`. The
/// lock is released when the surrounding transaction ends; outside a
/// transaction it is released immediately.
///
/// Keys are hashed to 32 bits, so unrelated keys may occasionally share a lock.
///
/// ## Errors
/// Returns a database error if the statement fails.
pub async fn advisory_xact_lock(
    conn: &mut AsyncPgConnection,
    key: &str,
) -> diesel::QueryResult<()> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind::<Text, _>(key)
        .execute(conn)
        .await
        .map(|_| ())
}
