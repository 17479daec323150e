//! bb8 pool of async `PostgreSQL` connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use sharecal_core::config::DatabaseConfig;

use crate::db::DbProvider;
use crate::error::DbResult;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'pool> = PooledConnection<'pool, AsyncPgConnection>;

/// How long a request waits for a free connection before failing with a pool error.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);

/// ## Summary
/// Creates a connection pool holding at most `size` connections.
///
/// ## Errors
/// Returns an error if the first connection to `database_url` cannot be opened.
#[tracing::instrument(skip(database_url), fields(pool_size = size))]
pub async fn create_pool(database_url: &str, size: u32) -> anyhow::Result<DbPool> {
    let size = size.max(1);
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(size)
        .min_idle(Some(1))
        .connection_timeout(CHECKOUT_TIMEOUT)
        .test_on_check_out(false)
        .build(manager)
        .await?;

    tracing::info!(pool_size = size, "Database pool ready");
    Ok(pool)
}

/// ## Errors
/// Returns an error if the configured database cannot be reached.
pub async fn pool_from_config(config: &DatabaseConfig) -> anyhow::Result<DbPool> {
    create_pool(&config.url, u32::from(config.max_connections)).await
}

impl DbProvider for DbPool {
    fn get_connection<'a>(
        &'a self,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DbResult<DbConnection<'a>>> + Send + 'a>>
    {
        Box::pin(async move { Ok(self.get().await?) })
    }
}
