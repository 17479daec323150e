use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

pub use crate::db::enums::{InvitationStatus, MemberRole};

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::calendar_invitations)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::calendar::Calendar, foreign_key = calendar_id))]
pub struct CalendarInvitation {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub inviter_id: uuid::Uuid,
    pub invitee_email: String,
    pub invitee_id: Option<uuid::Uuid>,
    pub role: MemberRole,
    pub status: InvitationStatus,
    #[serde(skip)]
    pub token: String,
    pub message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub responded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CalendarInvitation {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Expiry is checked at read time; there is no background sweeper.
    #[must_use]
    pub fn is_expired_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_invitations)]
pub struct NewCalendarInvitation<'a> {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub inviter_id: uuid::Uuid,
    pub invitee_email: &'a str,
    pub invitee_id: Option<uuid::Uuid>,
    pub role: MemberRole,
    pub token: &'a str,
    pub message: Option<&'a str>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
