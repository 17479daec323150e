//! Event storage and retrieval.

use std::collections::HashMap;

use diesel_async::AsyncPgConnection;
use serde::Deserialize;

use sharecal_core::util::nullable::nullable;
use sharecal_db::db::enums::{Priority, RecurrenceRule};
use sharecal_db::db::query;
use sharecal_db::db::query::event::EventWindow;
use sharecal_db::model::calendar::tag::CalendarTag;
use sharecal_db::model::event::{Event, EventChangeset, NewEvent};

use super::view::EventView;
use crate::calendar::{CalendarAccess, Role, role_of};
use crate::error::{ServiceError, ServiceResult};

const MAX_TITLE_LENGTH: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub calendar_id: uuid::Uuid,
    pub tag_id: Option<uuid::Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence_rule: RecurrenceRule,
    pub recurrence_end: Option<chrono::NaiveDate>,
    pub reminder_minutes: Option<i32>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
}

/// Partial update. Nullable columns take `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub calendar_id: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "nullable")]
    pub tag_id: Option<Option<uuid::Uuid>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub all_day: Option<bool>,
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default, deserialize_with = "nullable")]
    pub recurrence_end: Option<Option<chrono::NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub reminder_minutes: Option<Option<i32>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

/// Filters for event listing. Events overlapping `[from, to]` are returned.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EventQuery {
    pub calendar_id: Option<uuid::Uuid>,
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

impl EventQuery {
    fn window(&self) -> ServiceResult<EventWindow> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(ServiceError::invalid("'from' must not be after 'to'"));
        }
        Ok(EventWindow {
            from: self.from,
            to: self.to,
        })
    }
}

/// ## Summary
/// Checks an event's time range. Equal endpoints are a valid instant.
///
/// ## Errors
/// Returns `ValidationError` when the start is after the end.
pub fn validate_range(
    start: chrono::DateTime<chrono::Utc>,
    end: chrono::DateTime<chrono::Utc>,
) -> ServiceResult<()> {
    if start > end {
        return Err(ServiceError::invalid(
            "Event end must not be before its start",
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> ServiceResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::invalid("Event title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Event title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title)
}

fn validate_reminder(minutes: Option<i32>) -> ServiceResult<()> {
    if minutes.is_some_and(|m| m < 0) {
        return Err(ServiceError::invalid("Reminder must not be negative"));
    }
    Ok(())
}

fn validate_recurrence_end(
    start: chrono::DateTime<chrono::Utc>,
    recurrence_end: Option<chrono::NaiveDate>,
) -> ServiceResult<()> {
    if recurrence_end.is_some_and(|end| end < start.date_naive()) {
        return Err(ServiceError::invalid(
            "Recurrence end must not be before the event start",
        ));
    }
    Ok(())
}

/// The tag, which must belong to `calendar_id`.
async fn resolve_tag(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    tag_id: uuid::Uuid,
) -> ServiceResult<CalendarTag> {
    query::tag::find_in_calendar(conn, calendar_id, tag_id)
        .await?
        .ok_or(ServiceError::InvalidTagReference)
}

/// Loads an event and the caller's access to its calendar. Events in
/// calendars the caller cannot see are reported as missing.
async fn load_event(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    event_id: uuid::Uuid,
) -> ServiceResult<(Event, CalendarAccess)> {
    let not_found = || ServiceError::not_found("Event not found");
    let event = query::event::get_event(conn, event_id)
        .await?
        .ok_or_else(not_found)?;
    let access = CalendarAccess::load_any(conn, event.calendar_id, user_id).await?;
    if !access.role.can_view() {
        return Err(not_found());
    }
    Ok((event, access))
}

async fn tag_of(conn: &mut AsyncPgConnection, event: &Event) -> ServiceResult<Option<CalendarTag>> {
    match event.tag_id {
        Some(tag_id) => Ok(query::tag::find_in_calendar(conn, event.calendar_id, tag_id).await?),
        None => Ok(None),
    }
}

/// ## Summary
/// Creates an event in a calendar the user can edit.
///
/// ## Errors
/// Returns `ValidationError` for bad input, `InvalidTagReference` when the tag
/// belongs to another calendar and `NotFound` for invisible calendars.
#[tracing::instrument(skip(conn, request), fields(calendar_id = %request.calendar_id))]
pub async fn create_event(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    request: &CreateEventRequest,
) -> ServiceResult<EventView> {
    let title = validate_title(&request.title)?;
    validate_range(request.start_date, request.end_date)?;
    validate_reminder(request.reminder_minutes)?;
    validate_recurrence_end(request.start_date, request.recurrence_end)?;

    let access = CalendarAccess::load(conn, request.calendar_id, user_id).await?;
    access.require_edit_events()?;

    let tag = match request.tag_id {
        Some(tag_id) => Some(resolve_tag(conn, request.calendar_id, tag_id).await?),
        None => None,
    };

    let new_event = NewEvent {
        id: uuid::Uuid::now_v7(),
        calendar_id: request.calendar_id,
        tag_id: request.tag_id,
        title,
        description: request.description.trim(),
        location: request.location.trim(),
        start_date: request.start_date,
        end_date: request.end_date,
        all_day: request.all_day,
        recurrence_rule: request.recurrence_rule,
        recurrence_end: request.recurrence_end,
        reminder_minutes: request.reminder_minutes,
        priority: request.priority,
        is_completed: request.is_completed,
        completed_at: request.is_completed.then(chrono::Utc::now),
        created_by: Some(user_id),
    };
    let event = query::event::create_event(conn, &new_event).await?;

    tracing::info!(event_id = %event.id, "Event created");
    Ok(EventView::new(event, tag.as_ref(), access.role, user_id))
}

/// ## Errors
/// Returns `NotFound` for unknown events or events in invisible calendars.
#[tracing::instrument(skip(conn))]
pub async fn get_event(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    event_id: uuid::Uuid,
) -> ServiceResult<EventView> {
    let (event, access) = load_event(conn, user_id, event_id).await?;
    let tag = tag_of(conn, &event).await?;
    Ok(EventView::new(event, tag.as_ref(), access.role, user_id))
}

/// ## Summary
/// Lists events from every calendar the user can see, or from one calendar,
/// ordered by start.
///
/// ## Errors
/// Returns `ValidationError` for an inverted window and `NotFound` when a
/// requested calendar is not visible.
#[tracing::instrument(skip(conn))]
pub async fn list_events(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    filter: EventQuery,
) -> ServiceResult<Vec<EventView>> {
    let window = filter.window()?;

    let roles: HashMap<uuid::Uuid, Role> = if let Some(calendar_id) = filter.calendar_id {
        let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
        HashMap::from([(calendar_id, access.role)])
    } else {
        let calendars = query::calendar::list_accessible(conn, user_id).await?;
        let ids: Vec<_> = calendars.iter().map(|c| c.id).collect();
        let memberships: HashMap<_, _> = query::member::memberships_for_user(conn, user_id, &ids)
            .await?
            .into_iter()
            .map(|m| (m.calendar_id, m))
            .collect();
        calendars
            .iter()
            .map(|c| (c.id, role_of(c, user_id, memberships.get(&c.id))))
            .collect()
    };

    let calendar_ids: Vec<_> = roles.keys().copied().collect();
    let events = query::event::list_events(conn, &calendar_ids, window).await?;

    let tag_ids: Vec<_> = events.iter().filter_map(|e| e.tag_id).collect();
    let tags: HashMap<_, _> = query::tag::get_tags(conn, &tag_ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    Ok(events
        .into_iter()
        .map(|event| {
            let tag = event.tag_id.and_then(|id| tags.get(&id));
            let role = roles.get(&event.calendar_id).copied().unwrap_or(Role::None);
            EventView::new(event, tag, role, user_id)
        })
        .collect())
}

/// ## Errors
/// Returns `NotFound` when the calendar is not visible to the user.
pub async fn calendar_events(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    from: Option<chrono::DateTime<chrono::Utc>>,
    to: Option<chrono::DateTime<chrono::Utc>>,
) -> ServiceResult<Vec<EventView>> {
    list_events(
        conn,
        user_id,
        EventQuery {
            calendar_id: Some(calendar_id),
            from,
            to,
        },
    )
    .await
}

/// `completed_at` change implied by a completion flag update.
fn completion_change(
    was_completed: bool,
    is_completed: Option<bool>,
    now: chrono::DateTime<chrono::Utc>,
) -> Option<Option<chrono::DateTime<chrono::Utc>>> {
    match is_completed {
        Some(true) if !was_completed => Some(Some(now)),
        Some(false) => Some(None),
        _ => None,
    }
}

/// ## Summary
/// Updates an event. Moving it to another calendar requires edit rights on
/// both; a tag that is not re-specified on such a move is cleared.
///
/// ## Errors
/// Returns `NotFound`, `AuthorizationError`, `ValidationError` or
/// `InvalidTagReference`.
#[tracing::instrument(skip(conn, request))]
pub async fn update_event(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    event_id: uuid::Uuid,
    request: &UpdateEventRequest,
) -> ServiceResult<EventView> {
    let (event, access) = load_event(conn, user_id, event_id).await?;
    access.require_edit_events()?;

    let title = request.title.as_deref().map(validate_title).transpose()?;
    let start = request.start_date.unwrap_or(event.start_date);
    let end = request.end_date.unwrap_or(event.end_date);
    validate_range(start, end)?;
    if let Some(reminder) = request.reminder_minutes {
        validate_reminder(reminder)?;
    }
    let recurrence_end = request.recurrence_end.unwrap_or(event.recurrence_end);
    validate_recurrence_end(start, recurrence_end)?;

    let target_calendar = request.calendar_id.unwrap_or(event.calendar_id);
    let moving = target_calendar != event.calendar_id;
    let role = if moving {
        let target = CalendarAccess::load(conn, target_calendar, user_id).await?;
        target.require_edit_events()?;
        target.role
    } else {
        access.role
    };

    let tag_id = match request.tag_id {
        Some(Some(tag_id)) => Some(Some(resolve_tag(conn, target_calendar, tag_id).await?.id)),
        Some(None) => Some(None),
        None if moving && event.tag_id.is_some() => Some(None),
        None => None,
    };

    let now = chrono::Utc::now();
    let changes = EventChangeset {
        calendar_id: moving.then_some(target_calendar),
        tag_id,
        title,
        description: request.description.as_deref().map(str::trim),
        location: request.location.as_deref().map(str::trim),
        start_date: request.start_date,
        end_date: request.end_date,
        all_day: request.all_day,
        recurrence_rule: request.recurrence_rule,
        recurrence_end: request.recurrence_end,
        reminder_minutes: request.reminder_minutes,
        priority: request.priority,
        is_completed: request.is_completed,
        completed_at: completion_change(event.is_completed, request.is_completed, now),
        updated_at: Some(now),
    };
    let event = query::event::update_event(conn, event_id, &changes).await?;
    let tag = tag_of(conn, &event).await?;

    tracing::info!("Event updated");
    Ok(EventView::new(event, tag.as_ref(), role, user_id))
}

/// ## Summary
/// Deletes an event. Allowed for its creator and for calendar admins.
///
/// ## Errors
/// Returns `NotFound` for unknown events and `AuthorizationError` otherwise.
#[tracing::instrument(skip(conn))]
pub async fn delete_event(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    event_id: uuid::Uuid,
) -> ServiceResult<()> {
    let (event, access) = load_event(conn, user_id, event_id).await?;
    if !access.role.can_delete_event(event.created_by, user_id) {
        return Err(ServiceError::forbidden(
            "Only the event creator or a calendar admin can delete this event",
        ));
    }

    query::event::delete_event(conn, event_id).await?;
    tracing::info!("Event deleted");
    Ok(())
}
