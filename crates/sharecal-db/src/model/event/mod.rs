use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

pub use crate::db::enums::{Priority, RecurrenceRule};

#[derive(
    Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations, Serialize,
)]
#[diesel(table_name = schema::events)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::calendar::Calendar, foreign_key = calendar_id))]
pub struct Event {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub tag_id: Option<uuid::Uuid>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub all_day: bool,
    pub recurrence_rule: RecurrenceRule,
    pub recurrence_end: Option<chrono::NaiveDate>,
    pub reminder_minutes: Option<i32>,
    pub priority: Priority,
    pub is_completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_by: Option<uuid::Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::events)]
pub struct NewEvent<'a> {
    pub id: uuid::Uuid,
    pub calendar_id: uuid::Uuid,
    pub tag_id: Option<uuid::Uuid>,
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
    pub all_day: bool,
    pub recurrence_rule: RecurrenceRule,
    pub recurrence_end: Option<chrono::NaiveDate>,
    pub reminder_minutes: Option<i32>,
    pub priority: Priority,
    pub is_completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_by: Option<uuid::Uuid>,
}

/// Partial update. Nested `Option`s distinguish "leave" from "set to NULL".
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::events)]
pub struct EventChangeset<'a> {
    pub calendar_id: Option<uuid::Uuid>,
    pub tag_id: Option<Option<uuid::Uuid>>,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub all_day: Option<bool>,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub recurrence_end: Option<Option<chrono::NaiveDate>>,
    pub reminder_minutes: Option<Option<i32>>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
    pub completed_at: Option<Option<chrono::DateTime<chrono::Utc>>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
