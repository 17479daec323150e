use crate::db::schema;
use diesel::prelude::*;

/// A refresh token invalidated by logout, keyed by its `jti` claim.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::revoked_tokens)]
pub struct NewRevokedToken<'a> {
    pub jti: &'a str,
    pub user_id: uuid::Uuid,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
