//! `/api/invitations`: invitations addressed to the caller.

use salvo::prelude::Json;
use salvo::{Depot, Request, Router, handler};

use sharecal_core::constants::INVITATION_ROUTE_COMPONENT;
use sharecal_db::model::calendar::invitation::CalendarInvitation;
use sharecal_service::calendar::invitation;
use sharecal_service::calendar::view::{CalendarView, InvitationView};

use super::extract::{current_user, path_str};
use crate::config::get_config_from_depot;
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;

/// GET /invitations/received
#[handler]
async fn received(depot: &mut Depot) -> AppResult<Json<Vec<InvitationView>>> {
    let user = current_user(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(invitation::received_invitations(&mut conn, user).await?))
}

/// GET /invitations/{token}
#[handler]
async fn preview(req: &mut Request, depot: &mut Depot) -> AppResult<Json<InvitationView>> {
    let token = path_str(req, "token")?;
    current_user(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(invitation::preview_invitation(&mut conn, &token).await?))
}

/// POST /invitations/{token}/accept
#[handler]
async fn accept(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CalendarView>> {
    let token = path_str(req, "token")?;
    let user = current_user(depot)?;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        invitation::accept_invitation(&mut conn, user, &token, &settings.app).await?,
    ))
}

/// POST /invitations/{token}/decline
#[handler]
async fn decline(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CalendarInvitation>> {
    let token = path_str(req, "token")?;
    let user = current_user(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        invitation::decline_invitation(&mut conn, user, &token).await?,
    ))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(INVITATION_ROUTE_COMPONENT)
        .push(Router::with_path("received").get(received))
        .push(
            Router::with_path("{token}")
                .get(preview)
                .push(Router::with_path("accept").post(accept))
                .push(Router::with_path("decline").post(decline)),
        )
}
