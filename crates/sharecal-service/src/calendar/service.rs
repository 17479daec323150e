//! Calendar creation, listing and management.

use std::collections::HashMap;

use diesel_async::AsyncPgConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use serde::Deserialize;

use sharecal_core::config::AppConfig;
use sharecal_db::db::enums::CalendarType;
use sharecal_db::db::query;
use sharecal_db::db::transaction::{Committed, with_transaction};
use sharecal_db::model::calendar::{
    CalendarChangeset, DEFAULT_CALENDAR_COLOR, DEFAULT_CALENDAR_ICON, NewCalendar,
};

use super::access::{CalendarAccess, Role, role_of};
use super::tag::{normalize_color, seed_after_commit};
use super::view::{CalendarCheck, CalendarStats, CalendarView, RoleCounts};
use crate::error::{ServiceError, ServiceResult};

const MAX_CALENDAR_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCalendarRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub calendar_type: CalendarType,
    pub color: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCalendarRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub calendar_type: Option<CalendarType>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_public: Option<bool>,
}

fn validate_calendar_name(name: &str) -> ServiceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("Calendar name is required"));
    }
    if name.chars().count() > MAX_CALENDAR_NAME_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Calendar name must be at most {MAX_CALENDAR_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

/// ## Summary
/// Loads admin/member counts for a set of calendars. Calendars without
/// members are absent from the map.
///
/// ## Errors
/// Returns a database error if the aggregate query fails.
pub async fn role_counts_for(
    conn: &mut AsyncPgConnection,
    calendar_ids: &[uuid::Uuid],
) -> ServiceResult<HashMap<uuid::Uuid, RoleCounts>> {
    let mut counts: HashMap<uuid::Uuid, RoleCounts> = HashMap::new();
    for (calendar_id, role, count) in query::member::role_counts(conn, calendar_ids).await? {
        counts.entry(calendar_id).or_default().add(role, count);
    }
    Ok(counts)
}

async fn view_of(
    conn: &mut AsyncPgConnection,
    access: CalendarAccess,
    app: &AppConfig,
) -> ServiceResult<CalendarView> {
    let counts = role_counts_for(conn, &[access.calendar.id])
        .await?
        .remove(&access.calendar.id)
        .unwrap_or_default();
    Ok(CalendarView::new(access.calendar, access.role, counts, app))
}

/// ## Summary
/// Creates a calendar owned by `user_id`. The default tags are seeded once the
/// calendar row has been committed.
///
/// ## Errors
/// Returns `ValidationError` for a bad name or color, or a database error.
#[tracing::instrument(skip(conn, request, app), fields(user_id = %user_id))]
pub async fn create_calendar(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    request: &CreateCalendarRequest,
    app: &AppConfig,
) -> ServiceResult<CalendarView> {
    let name = validate_calendar_name(&request.name)?;
    let color = request
        .color
        .as_deref()
        .map(normalize_color)
        .transpose()?
        .unwrap_or_else(|| DEFAULT_CALENDAR_COLOR.to_string());
    let icon = request
        .icon
        .as_deref()
        .map(str::trim)
        .filter(|icon| !icon.is_empty())
        .unwrap_or(DEFAULT_CALENDAR_ICON);

    let new_calendar = NewCalendar {
        id: uuid::Uuid::now_v7(),
        name,
        description: request.description.trim(),
        calendar_type: request.calendar_type,
        color: &color,
        icon,
        is_public: request.is_public,
        owner_id: user_id,
    };

    let new_calendar = &new_calendar;
    let calendar = with_transaction(conn, |tx| {
        async move {
            let calendar = query::calendar::create_calendar(tx, new_calendar).await?;
            let hook = seed_after_commit(calendar.id);
            Ok::<_, ServiceError>(Committed::new(calendar).after_commit(hook))
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!(calendar_id = %calendar.id, "Calendar created");
    Ok(CalendarView::new(
        calendar,
        Role::Owner,
        RoleCounts::default(),
        app,
    ))
}

/// ## Summary
/// Lists calendars the user owns or is a member of, oldest first.
///
/// ## Errors
/// Returns a database error if any lookup fails.
#[tracing::instrument(skip(conn, app))]
pub async fn list_calendars(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    app: &AppConfig,
) -> ServiceResult<Vec<CalendarView>> {
    let calendars = query::calendar::list_accessible(conn, user_id).await?;
    let ids: Vec<_> = calendars.iter().map(|c| c.id).collect();

    let memberships: HashMap<_, _> = query::member::memberships_for_user(conn, user_id, &ids)
        .await?
        .into_iter()
        .map(|m| (m.calendar_id, m))
        .collect();
    let mut counts = role_counts_for(conn, &ids).await?;

    Ok(calendars
        .into_iter()
        .map(|calendar| {
            let role = role_of(&calendar, user_id, memberships.get(&calendar.id));
            let counts = counts.remove(&calendar.id).unwrap_or_default();
            CalendarView::new(calendar, role, counts, app)
        })
        .collect())
}

/// ## Errors
/// Returns `NotFound` if the calendar does not exist or is not visible to the user.
#[tracing::instrument(skip(conn, app))]
pub async fn get_calendar(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    app: &AppConfig,
) -> ServiceResult<CalendarView> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    view_of(conn, access, app).await
}

/// ## Errors
/// Returns `AuthorizationError` for non-admins and `ValidationError` for bad input.
#[tracing::instrument(skip(conn, request, app))]
pub async fn update_calendar(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    request: &UpdateCalendarRequest,
    app: &AppConfig,
) -> ServiceResult<CalendarView> {
    let mut access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    let name = request
        .name
        .as_deref()
        .map(validate_calendar_name)
        .transpose()?;
    let color = request.color.as_deref().map(normalize_color).transpose()?;
    let changes = CalendarChangeset {
        name,
        description: request.description.as_deref().map(str::trim),
        calendar_type: request.calendar_type,
        color: color.as_deref(),
        icon: request
            .icon
            .as_deref()
            .map(str::trim)
            .filter(|icon| !icon.is_empty()),
        is_public: request.is_public,
        updated_at: Some(chrono::Utc::now()),
    };

    access.calendar = query::calendar::update_calendar(conn, calendar_id, &changes).await?;
    tracing::info!("Calendar updated");
    view_of(conn, access, app).await
}

/// ## Summary
/// Deletes a calendar with its tags, members, invitations and events.
///
/// ## Errors
/// Returns `AuthorizationError` unless the caller is the owner or an admin.
#[tracing::instrument(skip(conn))]
pub async fn delete_calendar(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<()> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_delete_calendar()?;

    query::calendar::delete_calendar(conn, calendar_id).await?;
    tracing::info!("Calendar deleted");
    Ok(())
}

/// ## Summary
/// Reports whether the user has any calendar, split by ownership.
///
/// ## Errors
/// Returns a database error if counting fails.
#[tracing::instrument(skip(conn))]
pub async fn check_calendars(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> ServiceResult<CalendarCheck> {
    let owned_count = query::calendar::count_owned(conn, user_id).await?;
    let member_count = query::member::count_for_user(conn, user_id).await?;
    Ok(CalendarCheck {
        has_calendars: owned_count + member_count > 0,
        owned_count,
        member_count,
    })
}

/// ## Summary
/// Event and membership statistics. Upcoming events start after now, past
/// events ended before now.
///
/// ## Errors
/// Returns `NotFound` if the calendar is not visible to the user.
#[tracing::instrument(skip(conn))]
pub async fn calendar_stats(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<CalendarStats> {
    CalendarAccess::load(conn, calendar_id, user_id).await?;

    let (total_events, upcoming_events, past_events) =
        query::event::counts(conn, calendar_id, chrono::Utc::now()).await?;
    let counts = role_counts_for(conn, &[calendar_id])
        .await?
        .remove(&calendar_id)
        .unwrap_or_default();

    Ok(CalendarStats {
        total_events,
        upcoming_events,
        past_events,
        total_members: counts.total_with_owner(),
        admin_count: counts.admins,
        member_count: counts.members,
    })
}

/// ## Summary
/// Removes the caller's own membership.
///
/// ## Errors
/// Returns `OwnerCannotLeave` for the owner and `NotFound` for unrelated users.
#[tracing::instrument(skip(conn))]
pub async fn leave_calendar(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<()> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    if access.role == Role::Owner {
        return Err(ServiceError::OwnerCannotLeave);
    }
    if !access.role.can_leave() {
        return Err(ServiceError::not_found("Calendar not found"));
    }

    query::member::delete_member(conn, calendar_id, user_id).await?;
    tracing::info!("Left calendar");
    Ok(())
}
