use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

pub mod invitation;
pub mod member;
pub mod tag;

pub use crate::db::enums::CalendarType;

pub const DEFAULT_CALENDAR_COLOR: &str = "#007bff";
pub const DEFAULT_CALENDAR_ICON: &str = "📅";

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::calendars)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = owner_id))]
pub struct Calendar {
    pub id: uuid::Uuid,
    pub name: String,
    pub description: String,
    pub calendar_type: CalendarType,
    pub color: String,
    pub icon: String,
    pub is_public: bool,
    pub owner_id: uuid::Uuid,
    #[serde(skip)]
    pub share_token: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendars)]
pub struct NewCalendar<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub calendar_type: CalendarType,
    pub color: &'a str,
    pub icon: &'a str,
    pub is_public: bool,
    pub owner_id: uuid::Uuid,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::calendars)]
pub struct CalendarChangeset<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub calendar_type: Option<CalendarType>,
    pub color: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub is_public: Option<bool>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
