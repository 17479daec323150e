//! Query functions for calendars.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::{calendar_members, calendars};
use crate::model::calendar::{Calendar, CalendarChangeset, NewCalendar};

type BoxedQuery<'a, T> =
    calendars::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// ## Summary
/// Returns a query to select all calendars.
#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, Calendar> {
    calendars::table.select(Calendar::as_select()).into_boxed()
}

/// ## Summary
/// Returns a query to find a calendar by ID.
#[must_use]
pub fn by_id<'a>(id: uuid::Uuid) -> BoxedQuery<'a, Calendar> {
    all().filter(calendars::id.eq(id))
}

/// ## Summary
/// Returns a query for calendars a user owns or is a member of.
#[must_use]
pub fn accessible_by<'a>(user_id: uuid::Uuid) -> BoxedQuery<'a, Calendar> {
    let memberships = calendar_members::table
        .filter(calendar_members::user_id.eq(user_id))
        .select(calendar_members::calendar_id);

    all().filter(
        calendars::owner_id
            .eq(user_id)
            .or(calendars::id.eq_any(memberships)),
    )
}

/// ## Summary
/// Inserts a new calendar and returns the inserted record.
///
/// ## Errors
/// Returns a database error if the insert fails.
pub async fn create_calendar(
    conn: &mut AsyncPgConnection,
    new_calendar: &NewCalendar<'_>,
) -> diesel::QueryResult<Calendar> {
    diesel::insert_into(calendars::table)
        .values(new_calendar)
        .returning(Calendar::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Retrieves a calendar by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_calendar(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<Option<Calendar>> {
    by_id(id).get_result(conn).await.optional()
}

/// ## Summary
/// Loads several calendars by id. Unknown ids are skipped.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_calendars(
    conn: &mut AsyncPgConnection,
    ids: &[uuid::Uuid],
) -> diesel::QueryResult<Vec<Calendar>> {
    all()
        .filter(calendars::id.eq_any(ids))
        .get_results(conn)
        .await
}

/// ## Summary
/// Retrieves a calendar by its share token.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_by_share_token(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> diesel::QueryResult<Option<Calendar>> {
    all()
        .filter(calendars::share_token.eq(token))
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists the calendars a user can access, oldest first.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_accessible(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> diesel::QueryResult<Vec<Calendar>> {
    accessible_by(user_id)
        .order((calendars::created_at.asc(), calendars::id.asc()))
        .get_results(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count_owned(
    conn: &mut AsyncPgConnection,
    owner_id: uuid::Uuid,
) -> diesel::QueryResult<i64> {
    calendars::table
        .filter(calendars::owner_id.eq(owner_id))
        .count()
        .get_result(conn)
        .await
}

/// ## Summary
/// Applies a changeset and returns the updated calendar.
///
/// ## Errors
/// Returns a database error if the update fails or the calendar does not exist.
pub async fn update_calendar(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &CalendarChangeset<'_>,
) -> diesel::QueryResult<Calendar> {
    diesel::update(calendars::table.filter(calendars::id.eq(id)))
        .set(changes)
        .returning(Calendar::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes a calendar. Tags, members, invitations and events cascade.
///
/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_calendar(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(calendars::table.filter(calendars::id.eq(id)))
        .execute(conn)
        .await
}

/// ## Summary
/// Sets the share token only when none is present yet.
///
/// Returns `None` when another request already assigned a token.
///
/// ## Errors
/// Returns a database error if the update fails, including a unique violation
/// if the token collides with another calendar's.
pub async fn set_share_token_if_absent(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    token: &str,
) -> diesel::QueryResult<Option<Calendar>> {
    diesel::update(
        calendars::table
            .filter(calendars::id.eq(id))
            .filter(calendars::share_token.is_null()),
    )
    .set(calendars::share_token.eq(token))
    .returning(Calendar::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Summary
/// Replaces the share token unconditionally. The previous token stops
/// resolving immediately.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn replace_share_token(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    token: &str,
) -> diesel::QueryResult<Calendar> {
    diesel::update(calendars::table.filter(calendars::id.eq(id)))
        .set((
            calendars::share_token.eq(token),
            calendars::updated_at.eq(chrono::Utc::now()),
        ))
        .returning(Calendar::as_returning())
        .get_result(conn)
        .await
}
