//! Calendar tags and the default tag set.

use diesel_async::AsyncPgConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use futures::FutureExt;
use serde::Deserialize;

use sharecal_db::db::query;
use sharecal_db::db::transaction::{Committed, PostCommitHook, post_commit, with_transaction};
use sharecal_db::error::{DbResult, constraint};
use sharecal_db::model::calendar::tag::{CalendarTag, CalendarTagChangeset, NewCalendarTag};

use super::access::CalendarAccess;
use crate::error::{ServiceError, ServiceResult, conflict_on};

/// Tags every calendar starts with, in display order.
pub const DEFAULT_TAGS: [(&str, &str); 10] = [
    ("#FF6B6B", "빨강"),
    ("#FF9F40", "주황"),
    ("#FFD93D", "노랑"),
    ("#6BCF7F", "초록"),
    ("#4ECDC4", "민트"),
    ("#4A90E2", "파랑"),
    ("#9B59B6", "보라"),
    ("#FF6B9D", "분홍"),
    ("#95A5A6", "회색"),
    ("#34495E", "검정"),
];

const MAX_TAG_NAME_LENGTH: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTagRequest {
    pub name: String,
    pub color: String,
    pub order: Option<i32>,
}

/// One entry of a bulk tag update. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct TagUpdate {
    pub id: uuid::Uuid,
    pub name: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
}

impl TagUpdate {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.color.is_none() && self.order.is_none()
    }
}

/// ## Summary
/// Validates a `#RRGGBB` color and returns it upper-cased, so that the
/// per-calendar uniqueness of colors is case-insensitive.
///
/// ## Errors
/// Returns `ValidationError` for anything other than `#` followed by six hex digits.
pub fn normalize_color(color: &str) -> ServiceResult<String> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(color.to_ascii_uppercase())
    } else {
        Err(ServiceError::invalid(format!(
            "Invalid color '{color}', expected #RRGGBB"
        )))
    }
}

fn validate_name(name: &str) -> ServiceResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid("Tag name is required"));
    }
    if name.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(ServiceError::invalid(format!(
            "Tag name must be at most {MAX_TAG_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

fn default_rows(calendar_id: uuid::Uuid) -> Vec<NewCalendarTag<'static>> {
    DEFAULT_TAGS
        .iter()
        .zip(0_i32..)
        .map(|(&(color, name), sort_order)| NewCalendarTag {
            id: uuid::Uuid::now_v7(),
            calendar_id,
            name,
            color,
            sort_order,
        })
        .collect()
}

/// ## Summary
/// Inserts the default tag set into a calendar that has no tags yet.
///
/// Running it again, or concurrently, never produces more than the default set:
/// calendars that already have tags are skipped and inserts ignore colors that
/// already exist.
///
/// ## Errors
/// Returns a database error if counting or inserting fails.
#[tracing::instrument(skip(conn))]
pub async fn seed_default_tags(
    conn: &mut AsyncPgConnection,
    calendar_id: uuid::Uuid,
) -> DbResult<usize> {
    if query::tag::count_for_calendar(conn, calendar_id).await? > 0 {
        tracing::debug!("Calendar already has tags, skipping seed");
        return Ok(0);
    }
    let inserted = query::tag::insert_missing(conn, &default_rows(calendar_id)).await?;
    tracing::debug!(inserted, "Seeded default tags");
    Ok(inserted)
}

/// Post-commit hook that seeds the default tags of a newly created calendar.
#[must_use]
pub fn seed_after_commit(calendar_id: uuid::Uuid) -> PostCommitHook {
    post_commit(move |conn| {
        async move { seed_default_tags(conn, calendar_id).await.map(|_| ()) }.boxed()
    })
}

/// ## Errors
/// Returns `NotFound` if the calendar is not visible to the user.
#[tracing::instrument(skip(conn))]
pub async fn list_tags(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<Vec<CalendarTag>> {
    CalendarAccess::load(conn, calendar_id, user_id).await?;
    Ok(query::tag::list_for_calendar(conn, calendar_id).await?)
}

/// ## Summary
/// Adds a tag. Without an explicit order the tag goes after the existing ones.
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins, `ValidationError` for a bad
/// name or color and `DuplicateTagColor` if the color is already used.
#[tracing::instrument(skip(conn, request))]
pub async fn create_tag(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    request: &NewTagRequest,
) -> ServiceResult<CalendarTag> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    let name = validate_name(&request.name)?;
    let color = normalize_color(&request.color)?;
    let sort_order = match request.order {
        Some(order) => order,
        None => i32::try_from(query::tag::count_for_calendar(conn, calendar_id).await?)
            .unwrap_or(i32::MAX),
    };

    let new_tag = NewCalendarTag {
        id: uuid::Uuid::now_v7(),
        calendar_id,
        name,
        color: &color,
        sort_order,
    };
    let tag = query::tag::create_tag(conn, &new_tag)
        .await
        .map_err(conflict_on(constraint::CALENDAR_TAGS_CALENDAR_COLOR, || {
            ServiceError::DuplicateTagColor(color.clone())
        }))?;

    tracing::info!(tag_id = %tag.id, color = %tag.color, "Tag created");
    Ok(tag)
}

/// ## Summary
/// Applies a batch of tag edits atomically and returns the calendar's tags.
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins, `NotFound` when an id does not
/// belong to the calendar and `DuplicateTagColor` when a color collides with a
/// tag outside the batch or with another entry. No edit is applied when any
/// entry fails.
#[tracing::instrument(skip(conn, updates), fields(count = updates.len()))]
pub async fn update_tags(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    updates: &[TagUpdate],
) -> ServiceResult<Vec<CalendarTag>> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    let mut prepared = Vec::with_capacity(updates.len());
    for update in updates.iter().filter(|u| !u.is_empty()) {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let color = update.color.as_deref().map(normalize_color).transpose()?;
        prepared.push((update.id, name, color, update.order));
    }

    let prepared = &prepared;
    with_transaction(conn, |tx| {
        async move {
            // Recolored tags first move to placeholders that no `#RRGGBB`
            // value can equal, so a batch may swap colors between tags.
            for (index, (id, _, color, _)) in prepared.iter().enumerate() {
                if query::tag::find_in_calendar(tx, calendar_id, *id)
                    .await?
                    .is_none()
                {
                    return Err(ServiceError::not_found(format!("Tag {id} not found")));
                }
                if color.is_some() {
                    let placeholder = format!("~{index:06}");
                    let staged = CalendarTagChangeset {
                        name: None,
                        color: Some(placeholder.as_str()),
                        sort_order: None,
                    };
                    query::tag::update_tag(tx, *id, &staged).await?;
                }
            }
            for (id, name, color, order) in prepared {
                let changes = CalendarTagChangeset {
                    name: *name,
                    color: color.as_deref(),
                    sort_order: *order,
                };
                query::tag::update_tag(tx, *id, &changes)
                    .await
                    .map_err(conflict_on(constraint::CALENDAR_TAGS_CALENDAR_COLOR, || {
                        ServiceError::DuplicateTagColor(color.clone().unwrap_or_default())
                    }))?;
            }
            let tags = query::tag::list_for_calendar(tx, calendar_id).await?;
            Ok(Committed::new(tags))
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Deletes a tag. Events that used it keep existing without a tag.
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins and `NotFound` for unknown tags.
#[tracing::instrument(skip(conn))]
pub async fn delete_tag(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    tag_id: uuid::Uuid,
) -> ServiceResult<()> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    if query::tag::delete_tag(conn, calendar_id, tag_id).await? == 0 {
        return Err(ServiceError::not_found("Tag not found"));
    }
    tracing::info!("Tag deleted");
    Ok(())
}

/// ## Summary
/// Replaces all tags of a calendar with the default set.
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins.
#[tracing::instrument(skip(conn))]
pub async fn reset_tags(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<Vec<CalendarTag>> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    with_transaction(conn, |tx| {
        async move {
            let removed = query::tag::delete_all_for_calendar(tx, calendar_id).await?;
            seed_default_tags(tx, calendar_id).await?;
            tracing::info!(removed, "Tags reset to defaults");
            let tags = query::tag::list_for_calendar(tx, calendar_id).await?;
            Ok(Committed::new(tags))
        }
        .scope_boxed()
    })
    .await
}
