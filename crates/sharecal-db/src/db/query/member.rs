//! Query functions for calendar memberships.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::MemberRole;
use crate::db::schema::{calendar_members, users};
use crate::model::calendar::member::{CalendarMember, NewCalendarMember};
use crate::model::user::User;

type BoxedQuery<'a, T> =
    calendar_members::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, CalendarMember> {
    calendar_members::table
        .select(CalendarMember::as_select())
        .into_boxed()
}

/// ## Summary
/// Returns a query for the members of a calendar.
#[must_use]
pub fn by_calendar<'a>(calendar_id: uuid::Uuid) -> BoxedQuery<'a, CalendarMember> {
    all().filter(calendar_members::calendar_id.eq(calendar_id))
}

/// ## Summary
/// Finds a user's membership row in a calendar.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_member(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    user_id: uuid::Uuid,
) -> diesel::QueryResult<Option<CalendarMember>> {
    by_calendar(calendar_id)
        .filter(calendar_members::user_id.eq(user_id))
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Finds a user's memberships for several calendars at once.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn memberships_for_user(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_ids: &[uuid::Uuid],
) -> diesel::QueryResult<Vec<CalendarMember>> {
    all()
        .filter(calendar_members::user_id.eq(user_id))
        .filter(calendar_members::calendar_id.eq_any(calendar_ids))
        .get_results(conn)
        .await
}

/// ## Summary
/// Lists members of a calendar with their user records, earliest joiners first.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_with_users(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
) -> diesel::QueryResult<Vec<(CalendarMember, User)>> {
    calendar_members::table
        .inner_join(users::table)
        .filter(calendar_members::calendar_id.eq(calendar_id))
        .order((calendar_members::joined_at.asc(), calendar_members::id.asc()))
        .select((CalendarMember::as_select(), User::as_select()))
        .get_results(conn)
        .await
}

/// ## Summary
/// Counts member rows per role for each calendar given.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn role_counts(
    conn: &mut AsyncPgConnection,
    calendar_ids: &[uuid::Uuid],
) -> diesel::QueryResult<Vec<(uuid::Uuid, MemberRole, i64)>> {
    calendar_members::table
        .filter(calendar_members::calendar_id.eq_any(calendar_ids))
        .group_by((calendar_members::calendar_id, calendar_members::role))
        .select((
            calendar_members::calendar_id,
            calendar_members::role,
            diesel::dsl::count_star(),
        ))
        .get_results(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn count_for_user(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
) -> diesel::QueryResult<i64> {
    calendar_members::table
        .filter(calendar_members::user_id.eq(user_id))
        .count()
        .get_result(conn)
        .await
}

/// ## Summary
/// Inserts a membership row.
///
/// ## Errors
/// Returns a database error if the insert fails, including a unique violation
/// when the user is already a member.
pub async fn create_member(
    conn: &mut AsyncPgConnection,
    new_member: &NewCalendarMember,
) -> diesel::QueryResult<CalendarMember> {
    diesel::insert_into(calendar_members::table)
        .values(new_member)
        .returning(CalendarMember::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Changes a member's role. Returns `None` if the user is not a member.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_role(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    user_id: uuid::Uuid,
    role: MemberRole,
) -> diesel::QueryResult<Option<CalendarMember>> {
    diesel::update(
        calendar_members::table
            .filter(calendar_members::calendar_id.eq(calendar_id))
            .filter(calendar_members::user_id.eq(user_id)),
    )
    .set(calendar_members::role.eq(role))
    .returning(CalendarMember::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_member(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    user_id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(
        calendar_members::table
            .filter(calendar_members::calendar_id.eq(calendar_id))
            .filter(calendar_members::user_id.eq(user_id)),
    )
    .execute(conn)
    .await
}
