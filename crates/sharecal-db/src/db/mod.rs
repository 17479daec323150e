use crate::error::{DbError, DbResult};
use std::future::Future;
use std::pin::Pin;

use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub mod connection;
pub mod enums;
pub mod query;
pub mod schema;
pub mod transaction;

/// SQL migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub trait DbProvider: Send + Sync {
    fn get_connection<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = DbResult<connection::DbConnection<'a>>> + Send + 'a>>;
}

/// ## Summary
/// Applies any pending migrations to the database at `database_url`.
///
/// Runs on a blocking thread with a synchronous connection since the migration
/// harness is not async.
///
/// ## Errors
/// Returns an error if the connection cannot be established or a migration fails.
#[tracing::instrument(skip(database_url))]
pub async fn run_migrations(database_url: &str) -> DbResult<()> {
    let url = database_url.to_string();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&url)
            .map_err(|e| DbError::MigrationError(e.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|e| DbError::MigrationError(e.to_string()))
    })
    .await
    .map_err(|e| DbError::MigrationError(e.to_string()))??;

    tracing::info!(applied, "Database migrations complete");
    Ok(())
}
