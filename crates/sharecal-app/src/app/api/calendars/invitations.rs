use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, handler};

use sharecal_service::calendar::invitation::{self, InviteOutcome, InviteRequest};
use sharecal_service::calendar::view::InvitationView;

use crate::app::api::extract::{current_user, json_body, path_uuid};
use crate::config::get_config_from_depot;
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;
use crate::services::get_services_from_depot;

/// GET /calendars/{id}/invitations
#[handler]
pub async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<InvitationView>>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        invitation::list_invitations(&mut conn, user_id, calendar_id).await?,
    ))
}

/// POST /calendars/{id}/invitations
///
/// Responds 201 when at least one invitation was created, else 200 with the
/// skip reasons.
#[handler]
pub async fn invite(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<Vec<InviteOutcome>>> {
    let calendar_id = path_uuid(req, "id")?;
    let request: InviteRequest = json_body(req).await?;
    let inviter = current_user(depot)?.clone();
    let settings = get_config_from_depot(depot)?;
    let services = get_services_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;

    // The connection goes back to the pool before any email is sent
    let batch = {
        let mut conn = connection(provider.as_ref()).await?;
        invitation::invite(&mut conn, &inviter, calendar_id, &request, &settings.app).await?
    };
    if batch.any_created() {
        res.status_code(StatusCode::CREATED);
    }
    let outcomes = batch
        .notify(&inviter, services.invitation_mailer(&settings))
        .await;
    Ok(Json(outcomes))
}

/// DELETE /calendars/{id}/invitations/{invitation_id}
#[handler]
pub async fn cancel(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let calendar_id = path_uuid(req, "id")?;
    let invitation_id = path_uuid(req, "invitation_id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    invitation::cancel_invitation(&mut conn, user_id, calendar_id, invitation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
