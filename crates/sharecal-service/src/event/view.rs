use serde::Serialize;

use sharecal_db::model::calendar::tag::CalendarTag;
use sharecal_db::model::event::Event;

use crate::calendar::Role;

/// Color shown for events without a tag.
pub const UNTAGGED_EVENT_COLOR: &str = "#95A5A6";

/// An event as seen by one user.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub color: String,
    pub tag_name: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl EventView {
    /// `tag` is ignored unless it is the event's own tag.
    #[must_use]
    pub fn new(event: Event, tag: Option<&CalendarTag>, role: Role, user_id: uuid::Uuid) -> Self {
        let tag = tag.filter(|t| Some(t.id) == event.tag_id);
        Self {
            color: tag.map_or_else(|| UNTAGGED_EVENT_COLOR.to_string(), |t| t.color.clone()),
            tag_name: tag.map(|t| t.name.clone()),
            can_edit: role.can_edit_events(),
            can_delete: role.can_delete_event(event.created_by, user_id),
            event,
        }
    }
}
