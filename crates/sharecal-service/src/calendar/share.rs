//! Share-link join flow.
//!
//! ## Summary
//! Each calendar holds at most one share token. It is created the first time
//! somebody asks for the link and replaced on regeneration, which invalidates
//! the previous link immediately. Redeeming a token makes the caller a plain
//! member; share links never grant admin.

use diesel_async::AsyncPgConnection;
use serde::Deserialize;

use sharecal_core::config::AppConfig;
use sharecal_core::constants::FRONTEND_JOIN_PATH;
use sharecal_db::db::enums::MemberRole;
use sharecal_db::db::query;
use sharecal_db::error::{constraint, is_unique_violation_on};
use sharecal_db::model::calendar::Calendar;
use sharecal_db::model::calendar::member::NewCalendarMember;

use super::access::{CalendarAccess, Role};
use super::service::role_counts_for;
use super::view::{CalendarView, RoleCounts, ShareLink, SharePreview};
use crate::auth::token::generate_token;
use crate::error::{ServiceError, ServiceResult, conflict_on};

/// Attempts at drawing a token that no other calendar holds.
const TOKEN_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    #[serde(alias = "share_token")]
    pub token: String,
}

fn link_for(calendar: &Calendar, app: &AppConfig) -> ServiceResult<ShareLink> {
    let token = calendar
        .share_token
        .clone()
        .ok_or(ServiceError::InvariantViolation("share token missing"))?;
    Ok(ShareLink {
        share_url: app.frontend_link(FRONTEND_JOIN_PATH, &token),
        share_token: token,
    })
}

/// ## Summary
/// Returns the calendar's share link, creating the token on first use.
///
/// ## Errors
/// Returns `NotFound` if the calendar is not visible to the user.
#[tracing::instrument(skip(conn, app))]
pub async fn share_link(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    app: &AppConfig,
) -> ServiceResult<ShareLink> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    if access.calendar.share_token.is_some() {
        return link_for(&access.calendar, app);
    }

    for _ in 0..TOKEN_ATTEMPTS {
        let token = generate_token();
        match query::calendar::set_share_token_if_absent(conn, calendar_id, &token).await {
            Ok(Some(calendar)) => {
                tracing::info!("Share token created");
                return link_for(&calendar, app);
            }
            // Another request set it first
            Ok(None) => {
                let calendar = query::calendar::get_calendar(conn, calendar_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Calendar not found"))?;
                if calendar.share_token.is_some() {
                    return link_for(&calendar, app);
                }
            }
            Err(error) if is_unique_violation_on(&error, constraint::CALENDARS_SHARE_TOKEN) => {
                tracing::warn!("Share token collision, retrying");
            }
            Err(error) => return Err(error.into()),
        }
    }
    Err(ServiceError::InvariantViolation(
        "could not allocate a unique share token",
    ))
}

/// ## Summary
/// Replaces the share token. The old link stops working immediately.
///
/// ## Errors
/// Returns `AuthorizationError` unless the caller is the owner or an admin.
#[tracing::instrument(skip(conn, app))]
pub async fn regenerate_share_link(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    app: &AppConfig,
) -> ServiceResult<ShareLink> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    for _ in 0..TOKEN_ATTEMPTS {
        let token = generate_token();
        match query::calendar::replace_share_token(conn, calendar_id, &token).await {
            Ok(calendar) => {
                tracing::info!("Share token regenerated");
                return link_for(&calendar, app);
            }
            Err(error) if is_unique_violation_on(&error, constraint::CALENDARS_SHARE_TOKEN) => {
                tracing::warn!("Share token collision, retrying");
            }
            Err(error) => return Err(error.into()),
        }
    }
    Err(ServiceError::InvariantViolation(
        "could not allocate a unique share token",
    ))
}

async fn calendar_by_token(conn: &mut AsyncPgConnection, token: &str) -> ServiceResult<Calendar> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ServiceError::InvalidShareToken);
    }
    query::calendar::get_by_share_token(conn, token)
        .await?
        .ok_or(ServiceError::InvalidShareToken)
}

/// ## Summary
/// Describes the calendar behind a share token before the caller joins it.
///
/// ## Errors
/// Returns `InvalidShareToken` if no calendar holds the token.
#[tracing::instrument(skip(conn, token))]
pub async fn preview_by_share_token(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    token: &str,
) -> ServiceResult<SharePreview> {
    let calendar = calendar_by_token(conn, token).await?;
    let access = CalendarAccess::for_calendar(conn, calendar, user_id).await?;
    let owner_name = query::user::get_user(conn, access.calendar.owner_id)
        .await?
        .map(|owner| owner.display_name())
        .unwrap_or_default();
    let counts = role_counts_for(conn, &[access.calendar.id])
        .await?
        .remove(&access.calendar.id)
        .unwrap_or_default();

    let calendar = access.calendar;
    Ok(SharePreview {
        id: calendar.id,
        name: calendar.name,
        description: calendar.description,
        color: calendar.color,
        icon: calendar.icon,
        owner_name,
        member_count: counts.total_with_owner(),
        role: access.role,
        already_joined: access.role.can_view(),
    })
}

/// ## Summary
/// Joins the calendar behind a share token as a plain member.
///
/// ## Errors
/// Returns `InvalidShareToken` for unknown tokens, `AlreadyOwner` for the
/// owner and `AlreadyMember` for existing members.
#[tracing::instrument(skip(conn, token, app))]
pub async fn join_by_token(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    token: &str,
    app: &AppConfig,
) -> ServiceResult<CalendarView> {
    let calendar = calendar_by_token(conn, token).await?;
    let access = CalendarAccess::for_calendar(conn, calendar, user_id).await?;
    match access.role {
        Role::Owner => return Err(ServiceError::AlreadyOwner),
        Role::Admin | Role::Member => return Err(ServiceError::AlreadyMember),
        Role::None => {}
    }

    let new_member = NewCalendarMember {
        id: uuid::Uuid::now_v7(),
        calendar_id: access.calendar.id,
        user_id,
        role: MemberRole::Member,
    };
    query::member::create_member(conn, &new_member)
        .await
        .map_err(conflict_on(constraint::CALENDAR_MEMBERS_CALENDAR_USER, || {
            ServiceError::AlreadyMember
        }))?;

    tracing::info!(calendar_id = %access.calendar.id, "Joined calendar by share link");
    let counts = role_counts_for(conn, &[access.calendar.id])
        .await?
        .remove(&access.calendar.id)
        .unwrap_or(RoleCounts {
            admins: 0,
            members: 1,
        });
    Ok(CalendarView::new(access.calendar, Role::Member, counts, app))
}
