use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, handler};
use serde::Deserialize;

use sharecal_db::model::calendar::tag::CalendarTag;
use sharecal_service::calendar::tag::{self, NewTagRequest, TagUpdate};

use crate::app::api::extract::{current_user, json_body, path_uuid};
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;

/// Bulk update body: either `{"tags": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagUpdates {
    Wrapped { tags: Vec<TagUpdate> },
    Bare(Vec<TagUpdate>),
}

impl TagUpdates {
    fn into_inner(self) -> Vec<TagUpdate> {
        match self {
            Self::Wrapped { tags } | Self::Bare(tags) => tags,
        }
    }
}

/// GET /calendars/{id}/tags
#[handler]
pub async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<CalendarTag>>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(tag::list_tags(&mut conn, user_id, calendar_id).await?))
}

/// POST /calendars/{id}/tags
#[handler]
pub async fn create(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<CalendarTag>> {
    let calendar_id = path_uuid(req, "id")?;
    let request: NewTagRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    let created = tag::create_tag(&mut conn, user_id, calendar_id, &request).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(created))
}

/// PUT /calendars/{id}/tags
#[handler]
pub async fn update_all(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<CalendarTag>>> {
    let calendar_id = path_uuid(req, "id")?;
    let updates = json_body::<TagUpdates>(req).await?.into_inner();
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        tag::update_tags(&mut conn, user_id, calendar_id, &updates).await?,
    ))
}

/// POST /calendars/{id}/tags/reset
#[handler]
pub async fn reset(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<CalendarTag>>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(tag::reset_tags(&mut conn, user_id, calendar_id).await?))
}

/// DELETE /calendars/{id}/tags/{tag_id}
#[handler]
pub async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let calendar_id = path_uuid(req, "id")?;
    let tag_id = path_uuid(req, "tag_id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    tag::delete_tag(&mut conn, user_id, calendar_id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
