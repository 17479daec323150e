//! Query functions for calendar invitations.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::enums::InvitationStatus;
use crate::db::schema::calendar_invitations;
use crate::model::calendar::invitation::{CalendarInvitation, NewCalendarInvitation};

type BoxedQuery<'a, T> =
    calendar_invitations::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, CalendarInvitation> {
    calendar_invitations::table
        .select(CalendarInvitation::as_select())
        .into_boxed()
}

/// ## Summary
/// Returns a query for the invitations of a calendar, newest first.
#[must_use]
pub fn by_calendar<'a>(calendar_id: uuid::Uuid) -> BoxedQuery<'a, CalendarInvitation> {
    all()
        .filter(calendar_invitations::calendar_id.eq(calendar_id))
        .order(calendar_invitations::created_at.desc())
}

/// ## Summary
/// Inserts an invitation.
///
/// ## Errors
/// Returns a database error if the insert fails, including a unique violation
/// when a pending invitation for the same address already exists.
pub async fn create_invitation(
    conn: &mut AsyncPgConnection,
    new_invitation: &NewCalendarInvitation<'_>,
) -> diesel::QueryResult<CalendarInvitation> {
    diesel::insert_into(calendar_invitations::table)
        .values(new_invitation)
        .returning(CalendarInvitation::as_returning())
        .get_result(conn)
        .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_by_token(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> diesel::QueryResult<Option<CalendarInvitation>> {
    all()
        .filter(calendar_invitations::token.eq(token))
        .get_result(conn)
        .await
        .optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_for_calendar(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
) -> diesel::QueryResult<Vec<CalendarInvitation>> {
    by_calendar(calendar_id).get_results(conn).await
}

/// ## Summary
/// Finds the pending invitation for an address in a calendar, if any.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn find_pending(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    invitee_email: &str,
) -> diesel::QueryResult<Option<CalendarInvitation>> {
    all()
        .filter(calendar_invitations::calendar_id.eq(calendar_id))
        .filter(calendar_invitations::invitee_email.eq(invitee_email))
        .filter(calendar_invitations::status.eq(InvitationStatus::Pending))
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Lists pending, unexpired invitations addressed to an email, newest first.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn list_received(
    conn: &mut AsyncPgConnection,
    invitee_email: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> diesel::QueryResult<Vec<CalendarInvitation>> {
    all()
        .filter(calendar_invitations::invitee_email.eq(invitee_email))
        .filter(calendar_invitations::status.eq(InvitationStatus::Pending))
        .filter(calendar_invitations::expires_at.gt(now))
        .order(calendar_invitations::created_at.desc())
        .get_results(conn)
        .await
}

/// ## Summary
/// Moves a pending invitation to a terminal status.
///
/// The update only matches while the row is still pending, so concurrent
/// accept and decline calls cannot both succeed. Returns `None` when the
/// invitation was no longer pending.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn resolve(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    status: InvitationStatus,
    invitee_id: uuid::Uuid,
    at: chrono::DateTime<chrono::Utc>,
) -> diesel::QueryResult<Option<CalendarInvitation>> {
    diesel::update(
        calendar_invitations::table
            .filter(calendar_invitations::id.eq(id))
            .filter(calendar_invitations::status.eq(InvitationStatus::Pending)),
    )
    .set((
        calendar_invitations::status.eq(status),
        calendar_invitations::invitee_id.eq(Some(invitee_id)),
        calendar_invitations::responded_at.eq(Some(at)),
    ))
    .returning(CalendarInvitation::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// ## Errors
/// Returns a database error if the delete fails.
pub async fn delete_invitation(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::delete(
        calendar_invitations::table
            .filter(calendar_invitations::calendar_id.eq(calendar_id))
            .filter(calendar_invitations::id.eq(id)),
    )
    .execute(conn)
    .await
}
