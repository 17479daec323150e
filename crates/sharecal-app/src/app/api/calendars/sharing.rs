use salvo::prelude::Json;
use salvo::{Depot, Request, handler};
use serde::Deserialize;

use sharecal_service::calendar::share::{self, JoinRequest};
use sharecal_service::calendar::view::{CalendarView, ShareLink, SharePreview};

use crate::app::api::extract::{current_user, json_body, path_uuid, query};
use crate::config::get_config_from_depot;
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: String,
}

/// GET /calendars/{id}/share-link
#[handler]
pub async fn link(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ShareLink>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        share::share_link(&mut conn, user_id, calendar_id, &settings.app).await?,
    ))
}

/// POST /calendars/{id}/share-link/regenerate
#[handler]
pub async fn regenerate(req: &mut Request, depot: &mut Depot) -> AppResult<Json<ShareLink>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        share::regenerate_share_link(&mut conn, user_id, calendar_id, &settings.app).await?,
    ))
}

/// GET /calendars/share?token=
#[handler]
pub async fn preview(req: &mut Request, depot: &mut Depot) -> AppResult<Json<SharePreview>> {
    let TokenQuery { token } = query(req)?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        share::preview_by_share_token(&mut conn, user_id, &token).await?,
    ))
}

/// POST /calendars/join
#[handler]
pub async fn join(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CalendarView>> {
    let request: JoinRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        share::join_by_token(&mut conn, user_id, &request.token, &settings.app).await?,
    ))
}
