use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::calendar_tags)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::calendar::Calendar, foreign_key = calendar_id))]
pub struct CalendarTag {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub name: String,
    pub color: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::calendar_tags)]
pub struct NewCalendarTag<'a> {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub name: &'a str,
    pub color: &'a str,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::calendar_tags)]
pub struct CalendarTagChangeset<'a> {
    pub name: Option<&'a str>,
    pub color: Option<&'a str>,
    pub sort_order: Option<i32>,
}
