//! HTTP surface of the calendar-sharing backend.

pub mod app;
pub mod config;
pub mod db_handler;
pub mod error;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use salvo::Router;

use crate::config::{ConfigHandler, Settings};
use crate::db_handler::DbProviderHandler;
use crate::services::{AppServices, ServicesHandler};
use sharecal_db::db::connection::DbPool;

/// ## Summary
/// Full router: depot injection hoops followed by the API routes.
#[must_use]
pub fn router(pool: DbPool, settings: Settings, services: AppServices) -> Router {
    Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler::new(settings))
        .hoop(ServicesHandler {
            services: Arc::new(services),
        })
        .push(app::api::routes())
}
