mod app_specific;
mod auth;
mod calendars;
mod events;
pub mod extract;
mod invitations;

use salvo::Router;

use crate::middleware::auth::AuthMiddleware;

pub use sharecal_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, AUTH_ROUTE_PREFIX, CALENDAR_ROUTE_PREFIX,
    EVENT_ROUTE_PREFIX, INVITATION_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the `/api` router with every resource handler.
///
/// Expects `DbProviderHandler`, `ConfigHandler` and `ServicesHandler` to be
/// hooped above it.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .hoop(AuthMiddleware)
        .push(app_specific::routes())
        .push(auth::routes())
        .push(calendars::routes())
        .push(events::routes())
        .push(invitations::routes())
}
