use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

pub use crate::db::enums::MemberRole;

/// A non-owner membership. The owner never has a row here.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::calendar_members)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::calendar::Calendar, foreign_key = calendar_id))]
#[diesel(belongs_to(model::user::User, foreign_key = user_id))]
pub struct CalendarMember {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub role: MemberRole,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Insertable)]
#[diesel(table_name = schema::calendar_members)]
pub struct NewCalendarMember {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub role: MemberRole,
}
