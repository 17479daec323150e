//! Membership listing, removal and role changes.

use diesel_async::AsyncPgConnection;
use serde::Deserialize;

use sharecal_db::db::enums::MemberRole;
use sharecal_db::db::query;

use super::access::{CalendarAccess, Role};
use super::view::MemberView;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRoleRequest {
    pub user_id: uuid::Uuid,
    pub role: MemberRole,
}

/// ## Summary
/// Lists everyone with access to the calendar, owner first, then members in
/// join order.
///
/// ## Errors
/// Returns `NotFound` if the calendar is not visible to the user.
#[tracing::instrument(skip(conn))]
pub async fn list_members(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<Vec<MemberView>> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    let owner = query::user::get_user(conn, access.calendar.owner_id)
        .await?
        .ok_or(ServiceError::InvariantViolation("calendar owner missing"))?;

    let rows = query::member::list_with_users(conn, calendar_id).await?;
    let mut members = Vec::with_capacity(rows.len() + 1);
    members.push(MemberView::owner(&owner, &access.calendar));
    members.extend(
        rows.iter()
            .map(|(member, user)| MemberView::member(member, user)),
    );
    Ok(members)
}

/// Role held by `target_user_id`, or `NotFound` when they have none.
async fn target_role(
    conn: &mut AsyncPgConnection,
    access: &CalendarAccess,
    target_user_id: uuid::Uuid,
) -> ServiceResult<Role> {
    if access.calendar.owner_id == target_user_id {
        return Ok(Role::Owner);
    }
    query::member::find_member(conn, access.calendar.id, target_user_id)
        .await?
        .map(|member| Role::from(member.role))
        .ok_or_else(|| ServiceError::not_found("Member not found"))
}

/// ## Summary
/// Removes another user's membership.
///
/// ## Errors
/// Returns `AuthorizationError` unless the caller is an admin, when the target
/// is the owner, or when a non-owner targets an admin. Returns `NotFound` if
/// the target is not a member.
#[tracing::instrument(skip(conn))]
pub async fn remove_member(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    target_user_id: uuid::Uuid,
) -> ServiceResult<()> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    let target = target_role(conn, &access, target_user_id).await?;
    if target == Role::Owner {
        return Err(ServiceError::forbidden("The calendar owner cannot be removed"));
    }
    if !access.role.can_remove(target) {
        return Err(ServiceError::forbidden(
            "Only the calendar owner can remove an admin",
        ));
    }

    query::member::delete_member(conn, calendar_id, target_user_id).await?;
    tracing::info!(target_user_id = %target_user_id, "Member removed");
    Ok(())
}

/// ## Summary
/// Sets a member's role.
///
/// ## Errors
/// Returns `AuthorizationError` unless the caller is an admin, when the target
/// is the owner, or when a non-owner changes an admin. Returns `NotFound` if
/// the target is not a member.
#[tracing::instrument(skip(conn, request), fields(target_user_id = %request.user_id, role = %request.role))]
pub async fn change_role(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    request: &ChangeRoleRequest,
) -> ServiceResult<MemberView> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    let target = target_role(conn, &access, request.user_id).await?;
    if target == Role::Owner {
        return Err(ServiceError::forbidden(
            "The calendar owner's role cannot be changed",
        ));
    }
    if !access.role.can_change_role_of(target) {
        return Err(ServiceError::forbidden(
            "Only the calendar owner can change an admin's role",
        ));
    }

    let member = query::member::set_role(conn, calendar_id, request.user_id, request.role)
        .await?
        .ok_or_else(|| ServiceError::not_found("Member not found"))?;
    let user = query::user::get_user(conn, member.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    tracing::info!("Member role changed");
    Ok(MemberView::member(&member, &user))
}
