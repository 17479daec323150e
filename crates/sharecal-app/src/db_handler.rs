//! Database pool injection for request handlers.

use std::sync::Arc;

use salvo::async_trait;

use crate::error::AppResult;
use sharecal_core::error::CoreError;
use sharecal_db::db::DbProvider;
use sharecal_db::db::connection::DbConnection;

pub type SharedDbProvider = Arc<dyn DbProvider + Send + Sync>;

pub struct DbProviderHandler<T: DbProvider + Send + Sync + Clone> {
    pub provider: T,
}

#[async_trait]
impl<T: DbProvider + Send + Sync + Clone + 'static> salvo::Handler for DbProviderHandler<T> {
    #[tracing::instrument(skip_all)]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        let provider: SharedDbProvider = Arc::new(self.provider.clone());
        depot.inject(provider);
    }
}

/// ## Summary
/// Retrieves the database provider from the depot.
///
/// ## Errors
/// Returns an error if the database provider is not found in the depot.
pub fn get_db_from_depot(depot: &salvo::Depot) -> AppResult<SharedDbProvider> {
    depot
        .obtain::<SharedDbProvider>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Database provider not found in depot").into())
}

/// ## Summary
/// Checks out a connection for the current request.
///
/// ## Errors
/// Returns a pool error when no connection becomes available.
pub async fn connection(provider: &(dyn DbProvider + Send + Sync)) -> AppResult<DbConnection<'_>> {
    provider.get_connection().await.map_err(|error| {
        tracing::error!(%error, "Failed to get database connection");
        error.into()
    })
}
