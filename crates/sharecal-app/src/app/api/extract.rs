//! Request parsing shared by the JSON handlers.

use salvo::{Depot, Request};
use serde::de::DeserializeOwned;

use sharecal_db::model::user::User;
use sharecal_service::auth::get_user_from_depot;

use crate::error::{AppError, AppResult};

/// ## Errors
/// Returns `NotAuthenticated` for public requests.
pub fn current_user(depot: &Depot) -> AppResult<&User> {
    Ok(get_user_from_depot(depot)?)
}

/// ## Summary
/// Reads a UUID path parameter.
///
/// ## Errors
/// Returns `BadRequest` when the segment is missing or not a UUID.
pub fn path_uuid(req: &Request, name: &str) -> AppResult<uuid::Uuid> {
    let raw = req
        .param::<String>(name)
        .ok_or_else(|| AppError::bad_request(format!("Missing path parameter '{name}'")))?;
    uuid::Uuid::parse_str(&raw)
        .map_err(|_err| AppError::bad_request(format!("Invalid {name}: expected a UUID")))
}

/// ## Errors
/// Returns `BadRequest` when the segment is missing.
pub fn path_str(req: &Request, name: &str) -> AppResult<String> {
    req.param::<String>(name)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("Missing path parameter '{name}'")))
}

/// ## Errors
/// Returns `BadRequest` when the body is not valid JSON for `T`.
pub async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|error| {
        tracing::debug!(%error, "Rejected request body");
        AppError::bad_request(format!("Invalid request body: {error}"))
    })
}

/// ## Errors
/// Returns `BadRequest` when the query string does not fit `T`.
pub fn query<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_queries::<T>()
        .map_err(|error| AppError::bad_request(format!("Invalid query: {error}")))
}
