//! Query functions for calendar tags.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::calendar_tags;
use crate::model::calendar::tag::{CalendarTag, CalendarTagChangeset, NewCalendarTag};

type BoxedQuery<'a, T> =
    calendar_tags::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, CalendarTag> {
    calendar_tags::table
        .select(CalendarTag::as_select())
        .into_boxed()
}

/// ## Summary
/// Returns a query for a calendar's tags in display order.
#[must_use]
pub fn by_calendar<'a>(calendar_id: uuid::Uuid) -> BoxedQuery<'a, CalendarTag> {
    all()
        .filter(calendar_tags::calendar_id.eq(calendar_id))
        .order((calendar_tags::sort_order.asc(), calendar_tags::created_at.asc()))
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_calendar(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
) -> diesel::QueryResult<Vec<CalendarTag>> {
    by_calendar(calendar_id).get_results(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_tags(
    conn: &mut AsyncPgConnection,
    ids: &[uuid::Uuid],
) -> diesel::QueryResult<Vec<CalendarTag>> {
    all()
        .filter(calendar_tags::id.eq_any(ids))
        .get_results(conn)
        .await
}

/// ## Summary
/// Finds a tag only if it belongs to the given calendar.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_in_calendar(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    id: uuid::Uuid,
) -> diesel::QueryResult<Option<CalendarTag>> {
    all()
        .filter(calendar_tags::calendar_id.eq(calendar_id))
        .filter(calendar_tags::id.eq(id))
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count_for_calendar(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
) -> diesel::QueryResult<i64> {
    calendar_tags::table
        .filter(calendar_tags::calendar_id.eq(calendar_id))
        .count()
        .get_result(conn)
        .await
}

/// ## Summary
/// Inserts one tag.
///
/// ## Errors
/// Returns a database error if the insert fails, including a unique violation
/// on `(calendar_id, color)`.
pub async fn create_tag(
    conn: &mut AsyncPgConnection,
    new_tag: &NewCalendarTag<'_>,
) -> diesel::QueryResult<CalendarTag> {
    diesel::insert_into(calendar_tags::table)
        .values(new_tag)
        .returning(CalendarTag::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Inserts tags, silently skipping any whose color already exists in the calendar.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn insert_missing(
    conn: &mut AsyncPgConnection,
    new_tags: &[NewCalendarTag<'_>],
) -> diesel::QueryResult<usize> {
    diesel::insert_into(calendar_tags::table)
        .values(new_tags)
        .on_conflict((calendar_tags::calendar_id, calendar_tags::color))
        .do_nothing()
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails, including a unique violation
/// on `(calendar_id, color)`.
pub async fn update_tag(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &CalendarTagChangeset<'_>,
) -> diesel::QueryResult<CalendarTag> {
    diesel::update(calendar_tags::table.filter(calendar_tags::id.eq(id)))
        .set(changes)
        .returning(CalendarTag::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes a tag from a calendar. Events referencing it keep existing with no tag.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_tag(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(
        calendar_tags::table
            .filter(calendar_tags::calendar_id.eq(calendar_id))
            .filter(calendar_tags::id.eq(id)),
    )
    .execute(conn)
    .await
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_all_for_calendar(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(calendar_tags::table.filter(calendar_tags::calendar_id.eq(calendar_id)))
        .execute(conn)
        .await
}
