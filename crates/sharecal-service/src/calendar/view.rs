//! Response shapes for calendars and their members.

use serde::Serialize;

use sharecal_core::config::AppConfig;
use sharecal_core::constants::FRONTEND_JOIN_PATH;
use sharecal_db::db::enums::MemberRole;
use sharecal_db::model::calendar::Calendar;
use sharecal_db::model::calendar::invitation::CalendarInvitation;
use sharecal_db::model::calendar::member::CalendarMember;
use sharecal_db::model::user::User;

use super::access::Role;

/// Member counts of one calendar, excluding the owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub admins: i64,
    pub members: i64,
}

impl RoleCounts {
    pub fn add(&mut self, role: MemberRole, count: i64) {
        match role {
            MemberRole::Admin => self.admins += count,
            MemberRole::Member => self.members += count,
        }
    }

    /// Everyone with access, owner included.
    #[must_use]
    pub const fn total_with_owner(self) -> i64 {
        self.admins + self.members + 1
    }
}

/// A calendar as seen by one user, with capability hints for the client.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    #[serde(flatten)]
    pub calendar: Calendar,
    pub role: Role,
    pub is_owner: bool,
    pub is_admin: bool,
    pub can_edit_events: bool,
    pub can_leave: bool,
    pub can_delete: bool,
    pub member_count: i64,
    pub share_url: Option<String>,
}

impl CalendarView {
    #[must_use]
    pub fn new(calendar: Calendar, role: Role, counts: RoleCounts, app: &AppConfig) -> Self {
        let share_url = calendar
            .share_token
            .as_deref()
            .filter(|_| role.can_view())
            .map(|token| app.frontend_link(FRONTEND_JOIN_PATH, token));
        Self {
            role,
            is_owner: role == Role::Owner,
            is_admin: role.is_admin(),
            can_edit_events: role.can_edit_events(),
            can_leave: role.can_leave(),
            can_delete: role.can_delete_calendar(),
            member_count: counts.total_with_owner(),
            share_url,
            calendar,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub user_id: uuid::Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub role: Role,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl MemberView {
    /// The owner has no membership row; the calendar's creation time stands in.
    #[must_use]
    pub fn owner(owner: &User, calendar: &Calendar) -> Self {
        Self::from_user(owner, Role::Owner, calendar.created_at)
    }

    #[must_use]
    pub fn member(member: &CalendarMember, user: &User) -> Self {
        Self::from_user(user, Role::from(member.role), member.joined_at)
    }

    fn from_user(user: &User, role: Role, joined_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            display_name: user.display_name(),
            profile_image_url: user.profile_image_url.clone(),
            role,
            joined_at,
        }
    }
}

/// Calendar summary shown before joining through a share link.
#[derive(Debug, Clone, Serialize)]
pub struct SharePreview {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub color: String,
    pub icon: String,
    pub owner_name: String,
    pub member_count: i64,
    pub role: Role,
    pub already_joined: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub share_token: String,
    pub share_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarCheck {
    pub has_calendars: bool,
    pub owned_count: i64,
    pub member_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarStats {
    pub total_events: i64,
    pub upcoming_events: i64,
    pub past_events: i64,
    pub total_members: i64,
    pub admin_count: i64,
    pub member_count: i64,
}

/// An invitation with the context a recipient needs to decide on it.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationView {
    #[serde(flatten)]
    pub invitation: CalendarInvitation,
    pub calendar_name: String,
    pub inviter_name: String,
    pub is_expired: bool,
}

impl InvitationView {
    #[must_use]
    pub fn new(
        invitation: CalendarInvitation,
        calendar_name: String,
        inviter_name: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            is_expired: invitation.is_expired_at(now),
            invitation,
            calendar_name,
            inviter_name,
        }
    }
}
