//! `/api/events`: events across the caller's calendars.

use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, Router, handler};

use sharecal_core::constants::EVENT_ROUTE_COMPONENT;
use sharecal_service::event::EventView;
use sharecal_service::event::service::{
    self, CreateEventRequest, EventQuery, UpdateEventRequest,
};

use super::extract::{current_user, json_body, path_uuid, query};
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;

/// GET /events?calendar_id=&from=&to=
#[handler]
async fn list(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<EventView>>> {
    let filter: EventQuery = query(req)?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(service::list_events(&mut conn, user_id, filter).await?))
}

/// POST /events
#[handler]
async fn create(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<EventView>> {
    let request: CreateEventRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    let event = service::create_event(&mut conn, user_id, &request).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(event))
}

/// GET /events/{id}
#[handler]
async fn get(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventView>> {
    let event_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(service::get_event(&mut conn, user_id, event_id).await?))
}

/// PATCH /events/{id}
#[handler]
async fn update(req: &mut Request, depot: &mut Depot) -> AppResult<Json<EventView>> {
    let event_id = path_uuid(req, "id")?;
    let request: UpdateEventRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        service::update_event(&mut conn, user_id, event_id, &request).await?,
    ))
}

/// DELETE /events/{id}
#[handler]
async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let event_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    service::delete_event(&mut conn, user_id, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(EVENT_ROUTE_COMPONENT)
        .get(list)
        .post(create)
        .push(
            Router::with_path("{id}")
                .get(get)
                .patch(update)
                .delete(delete),
        )
}
