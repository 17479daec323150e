use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, handler};

use sharecal_service::calendar::member::{self, ChangeRoleRequest};
use sharecal_service::calendar::view::MemberView;

use crate::app::api::extract::{current_user, json_body, path_uuid};
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;

/// GET /calendars/{id}/members
#[handler]
pub async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<MemberView>>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        member::list_members(&mut conn, user_id, calendar_id).await?,
    ))
}

/// DELETE /calendars/{id}/members/{user_id}
#[handler]
pub async fn remove(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let calendar_id = path_uuid(req, "id")?;
    let target_user_id = path_uuid(req, "user_id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    member::remove_member(&mut conn, user_id, calendar_id, target_user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /calendars/{id}/change-role
#[handler]
pub async fn change_role(req: &mut Request, depot: &mut Depot) -> AppResult<Json<MemberView>> {
    let calendar_id = path_uuid(req, "id")?;
    let request: ChangeRoleRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        member::change_role(&mut conn, user_id, calendar_id, &request).await?,
    ))
}
