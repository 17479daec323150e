//! `/api/auth`: accounts, sessions and linked providers.

use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde::{Deserialize, Serialize};

use sharecal_core::constants::AUTH_ROUTE_COMPONENT;
use sharecal_db::db::enums::SocialProvider;
use sharecal_db::model::user::social_account::SocialAccount;
use sharecal_service::account::profile::{self, ChangePasswordRequest, UpdateProfileRequest};
use sharecal_service::account::session::{self, LoginRequest, RefreshRequest, RegisterRequest};
use sharecal_service::account::social::{self, SocialLoginRequest};
use sharecal_service::account::{AccessToken, AuthSession, ProfileView, SocialSession};

use super::extract::{current_user, json_body, path_str, query};
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::{AppError, AppResult};
use crate::services::get_services_from_depot;

#[derive(Debug, Deserialize)]
struct EmailQuery {
    email: String,
}

#[derive(Debug, Serialize)]
struct EmailCheck {
    exists: bool,
}

#[derive(Debug, Serialize)]
struct Detail {
    detail: &'static str,
}

/// POST /auth/register
#[handler]
async fn register(req: &mut Request, depot: &mut Depot, res: &mut Response) -> AppResult<Json<AuthSession>> {
    let request: RegisterRequest = json_body(req).await?;
    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    let session = session::register(&mut conn, &services.issuer, &request).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(session))
}

/// POST /auth/login
#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> AppResult<Json<AuthSession>> {
    let request: LoginRequest = json_body(req).await?;
    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(session::login(&mut conn, &services.issuer, &request).await?))
}

/// POST /auth/social-login
#[handler]
async fn social_login(req: &mut Request, depot: &mut Depot) -> AppResult<Json<SocialSession>> {
    let request: SocialLoginRequest = json_body(req).await?;
    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        social::social_login(&mut conn, &services.verifiers, &services.issuer, &request).await?,
    ))
}

/// POST /auth/token/refresh
#[handler]
async fn refresh(req: &mut Request, depot: &mut Depot) -> AppResult<Json<AccessToken>> {
    let request: RefreshRequest = json_body(req).await?;
    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        session::refresh(&mut conn, &services.issuer, &request.refresh).await?,
    ))
}

/// GET /auth/check-email?email=
#[handler]
async fn check_email(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EmailCheck>> {
    let EmailQuery { email } = query(req)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    let exists = session::check_email(&mut conn, &email).await?;
    Ok(Json(EmailCheck { exists }))
}

/// POST /auth/logout
#[handler]
async fn logout(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Detail>> {
    let request: RefreshRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    session::logout(&mut conn, &services.issuer, user_id, &request.refresh).await?;
    Ok(Json(Detail {
        detail: "Logged out",
    }))
}

/// GET /auth/me
#[handler]
async fn me(depot: &mut Depot) -> AppResult<Json<ProfileView>> {
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(profile::me(&mut conn, user_id).await?))
}

/// PATCH /auth/me
#[handler]
async fn update_me(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ProfileView>> {
    let request: UpdateProfileRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(profile::update_profile(&mut conn, user_id, &request).await?))
}

/// POST /auth/password/change
#[handler]
async fn change_password(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Detail>> {
    let request: ChangePasswordRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    profile::change_password(&mut conn, user_id, &request).await?;
    Ok(Json(Detail {
        detail: "Password changed",
    }))
}

/// GET /auth/social-accounts
#[handler]
async fn social_accounts(depot: &mut Depot) -> AppResult<Json<Vec<SocialAccount>>> {
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(social::list_social_accounts(&mut conn, user_id).await?))
}

/// DELETE /auth/social-accounts/{provider}
#[handler]
async fn disconnect(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let raw = path_str(req, "provider")?;
    let social_provider: SocialProvider = serde_json::from_value(serde_json::Value::String(raw))
        .map_err(|_err| AppError::bad_request("Unknown social provider"))?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    social::disconnect_social_account(&mut conn, user_id, social_provider).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(AUTH_ROUTE_COMPONENT)
        .push(Router::with_path("register").post(register))
        .push(Router::with_path("login").post(login))
        .push(Router::with_path("social-login").post(social_login))
        .push(Router::with_path("token/refresh").post(refresh))
        .push(Router::with_path("check-email").get(check_email))
        .push(Router::with_path("logout").post(logout))
        .push(Router::with_path("me").get(me).patch(update_me))
        .push(Router::with_path("password/change").post(change_password))
        .push(
            Router::with_path("social-accounts")
                .get(social_accounts)
                .push(Router::with_path("{provider}").delete(disconnect)),
        )
}
