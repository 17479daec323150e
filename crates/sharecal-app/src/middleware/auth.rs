use salvo::{Depot, Writer};

use crate::db_handler::{connection, get_db_from_depot};
use crate::error::{AppError, AppResult};
use crate::services::get_services_from_depot;
use sharecal_db::model::user::User;
use sharecal_service::auth::authenticate::{authenticate_access_token, bearer_token};
use sharecal_service::auth::depot::{DepotUser, depot_keys};
use sharecal_service::error::ServiceError;

/// ## Summary
/// Authentication middleware that resolves the bearer token and stores the user
/// in the depot. Requests without an `Authorization` header continue as public;
/// handlers that need a user reject them with 401.
///
/// ## Side Effects
/// Inserts a [`DepotUser`] under `depot_keys::AUTHENTICATED_USER`.
///
/// ## Errors
/// Responds 401 for a malformed, expired or revoked token and 500/503 when the
/// database is unavailable.
pub struct AuthMiddleware;

async fn resolve(req: &salvo::Request, depot: &Depot) -> AppResult<DepotUser> {
    let Some(header) = req
        .headers()
        .get(salvo::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(DepotUser::Public);
    };
    let token = bearer_token(header).ok_or_else(|| {
        ServiceError::AuthenticationError("Expected a Bearer token".to_string())
    })?;

    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;
    let user: User = authenticate_access_token(&mut conn, &services.issuer, token).await?;
    Ok(DepotUser::User(user))
}

#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Authenticating request");

        if req.method() == salvo::http::Method::OPTIONS {
            depot.insert(depot_keys::AUTHENTICATED_USER, DepotUser::Public);
            return;
        }

        match resolve(req, depot).await {
            Ok(principal) => {
                if let DepotUser::User(user) = &principal {
                    tracing::debug!(user_id = %user.id, "User authenticated");
                }
                depot.insert(depot_keys::AUTHENTICATED_USER, principal);
            }
            Err(error) => {
                if !matches!(&error, AppError::ServiceError(ServiceError::AuthenticationError(_))) {
                    tracing::error!(error = ?error, "Authentication failed with error");
                }
                error.write(req, depot, res).await;
                ctrl.skip_rest();
            }
        }
    }
}
