//! Query functions for events.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::events;
use crate::model::event::{Event, EventChangeset, NewEvent};

type BoxedQuery<'a, T> =
    events::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// Optional constraints for [`list_events`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventWindow {
    /// Only events ending at or after this instant.
    pub from: Option<chrono::DateTime<chrono::Utc>>,
    /// Only events starting at or before this instant.
    pub to: Option<chrono::DateTime<chrono::Utc>>,
}

#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, Event> {
    events::table.select(Event::as_select()).into_boxed()
}

#[must_use]
pub fn by_id<'a>(id: uuid::Uuid) -> BoxedQuery<'a, Event> {
    all().filter(events::id.eq(id))
}

/// ## Summary
/// Returns a query for events in any of the given calendars overlapping the window,
/// ordered by start time.
#[must_use]
pub fn in_calendars(calendar_ids: &[uuid::Uuid], window: EventWindow) -> BoxedQuery<'_, Event> {
    let mut query = all().filter(events::calendar_id.eq_any(calendar_ids));
    if let Some(from) = window.from {
        query = query.filter(events::end_date.ge(from));
    }
    if let Some(to) = window.to {
        query = query.filter(events::start_date.le(to));
    }
    query.order((events::start_date.asc(), events::id.asc()))
}

/// ## Summary
/// Inserts a new event and returns the inserted record.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_event(
    conn: &mut AsyncPgConnection,
    new_event: &NewEvent<'_>,
) -> diesel::QueryResult<Event> {
    diesel::insert_into(events::table)
        .values(new_event)
        .returning(Event::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_event(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<Option<Event>> {
    by_id(id).get_result(conn).await.optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_events(
    conn: &mut AsyncPgConnection,
    calendar_ids: &[uuid::Uuid],
    window: EventWindow,
) -> diesel::QueryResult<Vec<Event>> {
    in_calendars(calendar_ids, window).get_results(conn).await
}

/// ## Summary
/// Returns `(total, upcoming, past)` event counts for a calendar relative to `now`.
///
/// ## Errors
/// Returns a database error if a query fails.
pub async fn counts(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    now: chrono::DateTime<chrono::Utc>,
) -> diesel::QueryResult<(i64, i64, i64)> {
    let total = events::table
        .filter(events::calendar_id.eq(calendar_id))
        .count()
        .get_result(conn)
        .await?;
    let upcoming = events::table
        .filter(events::calendar_id.eq(calendar_id))
        .filter(events::start_date.gt(now))
        .count()
        .get_result(conn)
        .await?;
    let past = events::table
        .filter(events::calendar_id.eq(calendar_id))
        .filter(events::end_date.lt(now))
        .count()
        .get_result(conn)
        .await?;
    Ok((total, upcoming, past))
}

/// ## Errors
/// Returns a database error if the update fails or the event does not exist.
pub async fn update_event(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &EventChangeset<'_>,
) -> diesel::QueryResult<Event> {
    diesel::update(events::table.filter(events::id.eq(id)))
        .set(changes)
        .returning(Event::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_event(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(events::table.filter(events::id.eq(id)))
        .execute(conn)
        .await
}
