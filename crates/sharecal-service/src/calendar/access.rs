//! Calendar access-control model.
//!
//! ## Summary
//! A user's standing on a calendar is derived by [`role_of`] and nowhere else.
//! The owner is identified by `calendars.owner_id` and never has a membership
//! row; other users get their role from `calendar_members`, or [`Role::None`].
//!
//! Capability predicates never fail. Callers that need a hard gate use the
//! `require_*` methods on [`CalendarAccess`], which turn a `false` into the
//! matching [`ServiceError`].

use serde::Serialize;

use sharecal_db::db::enums::MemberRole;
use sharecal_db::db::query;
use sharecal_db::model::calendar::Calendar;
use sharecal_db::model::calendar::member::CalendarMember;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Member,
    None,
}

impl From<MemberRole> for Role {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Admin => Self::Admin,
            MemberRole::Member => Self::Member,
        }
    }
}

impl Role {
    /// Any relation to the calendar at all.
    #[must_use]
    pub const fn can_view(self) -> bool {
        !matches!(self, Self::None)
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    #[must_use]
    pub const fn can_edit_events(self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Member)
    }

    #[must_use]
    pub const fn can_delete_calendar(self) -> bool {
        self.is_admin()
    }

    /// Owners must delete the calendar instead.
    #[must_use]
    pub const fn can_leave(self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }

    /// ## Summary
    /// Whether this role may remove a member holding `target`.
    ///
    /// Admins remove plain members; only the owner removes admins. The owner
    /// cannot be removed.
    #[must_use]
    pub const fn can_remove(self, target: Role) -> bool {
        match target {
            Self::Member => self.is_admin(),
            Self::Admin => matches!(self, Self::Owner),
            Self::Owner | Self::None => false,
        }
    }

    /// ## Summary
    /// Whether this role may change the role of a member currently holding `target`.
    ///
    /// Admins may promote members; only the owner may change an admin's role.
    #[must_use]
    pub const fn can_change_role_of(self, target: Role) -> bool {
        self.can_remove(target)
    }

    /// ## Summary
    /// Event deletion: the creator, or any admin of the calendar.
    #[must_use]
    pub fn can_delete_event(self, created_by: Option<uuid::Uuid>, user_id: uuid::Uuid) -> bool {
        created_by == Some(user_id) || self.is_admin()
    }
}

/// ## Summary
/// Derives `user_id`'s role on `calendar`.
///
/// `membership` is the user's `calendar_members` row for this calendar, if any.
/// A row belonging to another calendar or user is ignored.
#[must_use]
pub fn role_of(
    calendar: &Calendar,
    user_id: uuid::Uuid,
    membership: Option<&CalendarMember>,
) -> Role {
    if calendar.owner_id == user_id {
        return Role::Owner;
    }
    membership
        .filter(|m| m.calendar_id == calendar.id && m.user_id == user_id)
        .map_or(Role::None, |m| Role::from(m.role))
}

/// A calendar together with the caller's role on it.
#[derive(Debug, Clone)]
pub struct CalendarAccess {
    pub calendar: Calendar,
    pub user_id: uuid::Uuid,
    pub role: Role,
}

impl CalendarAccess {
    /// ## Summary
    /// Loads a calendar and the caller's role. Calendars the caller has no
    /// relation to are reported as missing.
    ///
    /// ## Errors
    /// Returns `NotFound` if the calendar does not exist or is not visible to the
    /// user, or a database error.
    pub async fn load(
        conn: &mut diesel_async::AsyncPgConnection,
        calendar_id: uuid::Uuid,
        user_id: uuid::Uuid,
    ) -> ServiceResult<Self> {
        let access = Self::load_any(conn, calendar_id, user_id).await?;
        if !access.role.can_view() {
            return Err(ServiceError::not_found("Calendar not found"));
        }
        Ok(access)
    }

    /// ## Summary
    /// Like [`CalendarAccess::load`] but returns role `None` for unrelated users
    /// instead of failing.
    ///
    /// ## Errors
    /// Returns `NotFound` if the calendar does not exist, or a database error.
    pub async fn load_any(
        conn: &mut diesel_async::AsyncPgConnection,
        calendar_id: uuid::Uuid,
        user_id: uuid::Uuid,
    ) -> ServiceResult<Self> {
        let calendar = query::calendar::get_calendar(conn, calendar_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Calendar not found"))?;
        Self::for_calendar(conn, calendar, user_id).await
    }

    /// ## Summary
    /// Derives the caller's role on an already loaded calendar.
    ///
    /// ## Errors
    /// Returns a database error if the membership lookup fails.
    pub async fn for_calendar(
        conn: &mut diesel_async::AsyncPgConnection,
        calendar: Calendar,
        user_id: uuid::Uuid,
    ) -> ServiceResult<Self> {
        let membership = if calendar.owner_id == user_id {
            None
        } else {
            query::member::find_member(conn, calendar.id, user_id).await?
        };
        let role = role_of(&calendar, user_id, membership.as_ref());
        Ok(Self {
            calendar,
            user_id,
            role,
        })
    }

    /// ## Errors
    /// Returns `AuthorizationError` unless the caller is the owner or an admin.
    pub fn require_admin(&self) -> ServiceResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::forbidden(
                "Only the calendar owner or an admin can do this",
            ))
        }
    }

    /// ## Errors
    /// Returns `AuthorizationError` unless the caller can edit events here.
    pub fn require_edit_events(&self) -> ServiceResult<()> {
        if self.role.can_edit_events() {
            Ok(())
        } else {
            Err(ServiceError::forbidden(
                "You cannot edit events in this calendar",
            ))
        }
    }

    /// ## Errors
    /// Returns `AuthorizationError` unless the caller may delete the calendar.
    pub fn require_delete_calendar(&self) -> ServiceResult<()> {
        if self.role.can_delete_calendar() {
            Ok(())
        } else {
            Err(ServiceError::forbidden(
                "Only the calendar owner or an admin can delete this calendar",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(owner_id: uuid::Uuid) -> Calendar {
        let now = chrono::Utc::now();
        Calendar {
            id: uuid::Uuid::now_v7(),
            name: "Team".to_string(),
            description: String::new(),
            calendar_type: sharecal_db::db::enums::CalendarType::Shared,
            color: "#007bff".to_string(),
            icon: "📅".to_string(),
            is_public: false,
            owner_id,
            share_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn member(calendar: &Calendar, user_id: uuid::Uuid, role: MemberRole) -> CalendarMember {
        CalendarMember {
            id: uuid::Uuid::now_v7(),
            calendar_id: calendar.id,
            user_id,
            role,
            joined_at: chrono::Utc::now(),
        }
    }

    const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Member, Role::None];

    #[test]
    fn owner_derived_from_calendar() {
        let owner = uuid::Uuid::now_v7();
        let cal = calendar(owner);
        assert_eq!(role_of(&cal, owner, None), Role::Owner);
    }

    #[test]
    fn owner_wins_over_stray_membership_row() {
        let owner = uuid::Uuid::now_v7();
        let cal = calendar(owner);
        let row = member(&cal, owner, MemberRole::Member);
        assert_eq!(role_of(&cal, owner, Some(&row)), Role::Owner);
    }

    #[test]
    fn member_roles_from_row() {
        let cal = calendar(uuid::Uuid::now_v7());
        let user = uuid::Uuid::now_v7();
        let admin = member(&cal, user, MemberRole::Admin);
        let plain = member(&cal, user, MemberRole::Member);
        assert_eq!(role_of(&cal, user, Some(&admin)), Role::Admin);
        assert_eq!(role_of(&cal, user, Some(&plain)), Role::Member);
        assert_eq!(role_of(&cal, user, None), Role::None);
    }

    #[test]
    fn rows_for_other_calendar_or_user_ignored() {
        let cal = calendar(uuid::Uuid::now_v7());
        let other = calendar(uuid::Uuid::now_v7());
        let user = uuid::Uuid::now_v7();
        let foreign_calendar = member(&other, user, MemberRole::Admin);
        let foreign_user = member(&cal, uuid::Uuid::now_v7(), MemberRole::Admin);
        assert_eq!(role_of(&cal, user, Some(&foreign_calendar)), Role::None);
        assert_eq!(role_of(&cal, user, Some(&foreign_user)), Role::None);
    }

    #[test]
    fn capability_table() {
        // (role, view, admin, edit events, delete calendar, leave)
        let expected = [
            (Role::Owner, true, true, true, true, false),
            (Role::Admin, true, true, true, true, true),
            (Role::Member, true, false, true, false, true),
            (Role::None, false, false, false, false, false),
        ];
        for (role, view, admin, edit, delete, leave) in expected {
            assert_eq!(role.can_view(), view, "{role:?} view");
            assert_eq!(role.is_admin(), admin, "{role:?} admin");
            assert_eq!(role.can_edit_events(), edit, "{role:?} edit");
            assert_eq!(role.can_delete_calendar(), delete, "{role:?} delete");
            assert_eq!(role.can_leave(), leave, "{role:?} leave");
        }
    }

    #[test]
    fn event_deletion_by_creator_or_admin() {
        let me = uuid::Uuid::now_v7();
        let someone = uuid::Uuid::now_v7();
        assert!(Role::Member.can_delete_event(Some(me), me));
        assert!(!Role::Member.can_delete_event(Some(someone), me));
        assert!(!Role::Member.can_delete_event(None, me));
        assert!(Role::Admin.can_delete_event(Some(someone), me));
        assert!(Role::Owner.can_delete_event(None, me));
        assert!(!Role::None.can_delete_event(Some(someone), me));
    }

    #[test]
    fn removal_rules() {
        assert!(Role::Owner.can_remove(Role::Admin));
        assert!(Role::Owner.can_remove(Role::Member));
        assert!(Role::Admin.can_remove(Role::Member));
        assert!(!Role::Admin.can_remove(Role::Admin));
        assert!(!Role::Member.can_remove(Role::Member));
        for actor in ALL {
            assert!(!actor.can_remove(Role::Owner));
            assert!(!actor.can_remove(Role::None));
        }
    }

    #[test]
    fn role_change_rules() {
        assert!(Role::Admin.can_change_role_of(Role::Member));
        assert!(!Role::Admin.can_change_role_of(Role::Admin));
        assert!(Role::Owner.can_change_role_of(Role::Admin));
        assert!(!Role::Member.can_change_role_of(Role::Member));
    }

    #[test]
    fn unrelated_user_denied_without_error() {
        let access = CalendarAccess {
            calendar: calendar(uuid::Uuid::now_v7()),
            user_id: uuid::Uuid::now_v7(),
            role: Role::None,
        };
        assert!(matches!(
            access.require_admin(),
            Err(ServiceError::AuthorizationError(_))
        ));
        assert!(access.require_edit_events().is_err());
        assert!(access.require_delete_calendar().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Owner).unwrap(), "\"owner\"");
        assert_eq!(serde_json::to_string(&Role::None).unwrap(), "\"none\"");
    }
}
