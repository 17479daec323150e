use salvo::http::StatusCode;
use salvo::prelude::Json;
use salvo::{Depot, Request, Response, handler};

use sharecal_service::calendar::service::{self, CreateCalendarRequest, UpdateCalendarRequest};
use sharecal_service::calendar::view::{CalendarCheck, CalendarStats, CalendarView};
use sharecal_service::event::EventView;
use sharecal_service::event::service::{EventQuery, calendar_events};

use crate::app::api::extract::{current_user, json_body, path_uuid, query};
use crate::config::get_config_from_depot;
use crate::db_handler::{connection, get_db_from_depot};
use crate::error::AppResult;

/// GET /calendars
#[handler]
pub async fn list(depot: &mut Depot) -> AppResult<Json<Vec<CalendarView>>> {
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        service::list_calendars(&mut conn, user_id, &settings.app).await?,
    ))
}

/// POST /calendars
#[handler]
pub async fn create(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<CalendarView>> {
    let request: CreateCalendarRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    let calendar = service::create_calendar(&mut conn, user_id, &request, &settings.app).await?;
    res.status_code(StatusCode::CREATED);
    Ok(Json(calendar))
}

/// GET /calendars/check
#[handler]
pub async fn check(depot: &mut Depot) -> AppResult<Json<CalendarCheck>> {
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(service::check_calendars(&mut conn, user_id).await?))
}

/// GET /calendars/{id}
#[handler]
pub async fn get(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CalendarView>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        service::get_calendar(&mut conn, user_id, calendar_id, &settings.app).await?,
    ))
}

/// PATCH /calendars/{id}
#[handler]
pub async fn update(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CalendarView>> {
    let calendar_id = path_uuid(req, "id")?;
    let request: UpdateCalendarRequest = json_body(req).await?;
    let user_id = current_user(depot)?.id;
    let settings = get_config_from_depot(depot)?;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        service::update_calendar(&mut conn, user_id, calendar_id, &request, &settings.app).await?,
    ))
}

/// DELETE /calendars/{id}
#[handler]
pub async fn delete(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    service::delete_calendar(&mut conn, user_id, calendar_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /calendars/{id}/stats
#[handler]
pub async fn stats(req: &mut Request, depot: &mut Depot) -> AppResult<Json<CalendarStats>> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        service::calendar_stats(&mut conn, user_id, calendar_id).await?,
    ))
}

/// POST /calendars/{id}/leave
#[handler]
pub async fn leave(req: &mut Request, depot: &mut Depot) -> AppResult<StatusCode> {
    let calendar_id = path_uuid(req, "id")?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    service::leave_calendar(&mut conn, user_id, calendar_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /calendars/{id}/events?from=&to=
#[handler]
pub async fn events(req: &mut Request, depot: &mut Depot) -> AppResult<Json<Vec<EventView>>> {
    let calendar_id = path_uuid(req, "id")?;
    let window: EventQuery = query(req)?;
    let user_id = current_user(depot)?.id;
    let provider = get_db_from_depot(depot)?;
    let mut conn = connection(provider.as_ref()).await?;

    Ok(Json(
        calendar_events(&mut conn, user_id, calendar_id, window.from, window.to).await?,
    ))
}
