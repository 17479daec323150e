//! Targeted invitations.
//!
//! ## Summary
//! An invitation moves from `pending` to either `accepted` or `declined` and
//! never changes again. Only one pending invitation may exist per calendar and
//! address; resolved rows do not block a new invitation. Expiry is checked when
//! the invitation is used, nothing sweeps stale rows.
//!
//! Acceptance creates the membership and resolves the invitation in a single
//! transaction. The notification email is sent after the invitation row has
//! been committed and a delivery failure only shows up as `email_sent: false`.

use std::collections::{HashMap, HashSet};

use diesel_async::AsyncPgConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use serde::{Deserialize, Serialize};

use sharecal_core::config::AppConfig;
use sharecal_core::constants::{FRONTEND_INVITATION_PATH, MAX_INVITES_PER_REQUEST};
use sharecal_core::util::email::normalize_email;
use sharecal_db::db::enums::{InvitationStatus, MemberRole};
use sharecal_db::db::query;
use sharecal_db::db::transaction::{Committed, with_transaction};
use sharecal_db::error::constraint;
use sharecal_db::model::calendar::Calendar;
use sharecal_db::model::calendar::invitation::{CalendarInvitation, NewCalendarInvitation};
use sharecal_db::model::calendar::member::NewCalendarMember;
use sharecal_db::model::user::User;

use super::access::{CalendarAccess, Role};
use super::service::role_counts_for;
use super::view::{CalendarView, InvitationView};
use crate::auth::token::generate_token;
use crate::error::{ServiceError, ServiceResult, conflict_on};
use crate::mail::templates::{InvitationEmail, invitation_email};
use crate::mail::{EmailDispatcher, send_best_effort};

const MAX_MESSAGE_LENGTH: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct InviteRequest {
    pub emails: Vec<String>,
    #[serde(default)]
    pub role: MemberRole,
    pub message: Option<String>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Why an address did not receive an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidEmail,
    AlreadyOwner,
    AlreadyMember,
    AlreadyInvited,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InviteOutcome {
    Created {
        email: String,
        invitation: CalendarInvitation,
        email_sent: bool,
    },
    Skipped {
        email: String,
        reason: SkipReason,
    },
}

/// What invitation emails need besides the invitation itself.
#[derive(Clone, Copy)]
pub struct InvitationMailer<'a> {
    pub dispatcher: &'a dyn EmailDispatcher,
    pub from: &'a str,
    pub app: &'a AppConfig,
}

impl std::fmt::Debug for InvitationMailer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvitationMailer")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

/// One requested address, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Address {
    /// Normalized; later repeats of the same address are dropped.
    Valid(String),
    /// The raw input, trimmed.
    Invalid(String),
}

/// ## Summary
/// Checks the request size and classifies each address, keeping request order.
fn parse_addresses(emails: &[String]) -> ServiceResult<Vec<Address>> {
    if emails.is_empty() || emails.len() > MAX_INVITES_PER_REQUEST {
        return Err(ServiceError::invalid(format!(
            "Between 1 and {MAX_INVITES_PER_REQUEST} email addresses are required"
        )));
    }
    let mut seen = HashSet::new();
    Ok(emails
        .iter()
        .filter_map(|raw| match normalize_email(raw) {
            Some(email) => seen.insert(email.clone()).then_some(Address::Valid(email)),
            None => Some(Address::Invalid(raw.trim().to_string())),
        })
        .collect())
}

fn validate_message(message: Option<&str>) -> ServiceResult<Option<&str>> {
    let message = message.map(str::trim).filter(|m| !m.is_empty());
    if message.is_some_and(|m| m.chars().count() > MAX_MESSAGE_LENGTH) {
        return Err(ServiceError::invalid(format!(
            "Message must be at most {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(message)
}

/// ## Summary
/// Checks that `invitation` can still be answered by `user_id`.
///
/// ## Errors
/// Returns `InvitationAlreadyResolved` once answered, `InvitationExpired` past
/// expiry (only when `enforce_expiry`) and `AuthorizationError` when the
/// invitation is bound to a different user.
pub fn check_answerable(
    invitation: &CalendarInvitation,
    user_id: uuid::Uuid,
    now: chrono::DateTime<chrono::Utc>,
    enforce_expiry: bool,
) -> ServiceResult<()> {
    if !invitation.is_pending() {
        return Err(ServiceError::InvitationAlreadyResolved(invitation.status));
    }
    if enforce_expiry && invitation.is_expired_at(now) {
        return Err(ServiceError::InvitationExpired);
    }
    if invitation.invitee_id.is_some_and(|id| id != user_id) {
        return Err(ServiceError::forbidden(
            "This invitation was sent to another user",
        ));
    }
    Ok(())
}

/// Invitations recorded by [`invite`] whose emails have not been sent yet.
#[derive(Debug)]
pub struct InviteBatch {
    calendar: Calendar,
    outcomes: Vec<InviteOutcome>,
}

impl InviteBatch {
    #[must_use]
    pub fn any_created(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, InviteOutcome::Created { .. }))
    }

    /// ## Summary
    /// Emails every created invitation and records whether delivery worked.
    /// Needs no database connection.
    pub async fn notify(
        mut self,
        inviter: &User,
        mailer: InvitationMailer<'_>,
    ) -> Vec<InviteOutcome> {
        for outcome in &mut self.outcomes {
            if let InviteOutcome::Created {
                invitation,
                email_sent,
                ..
            } = outcome
            {
                *email_sent = notify_invitee(mailer, inviter, &self.calendar, invitation).await;
                tracing::info!(
                    invitation_id = %invitation.id,
                    email_sent = *email_sent,
                    "Invitation sent"
                );
            }
        }
        self.outcomes
    }
}

/// ## Summary
/// Records invitations for up to ten addresses of a calendar.
///
/// Each address is handled on its own and outcomes follow request order:
/// owners, members and addresses with a live pending invitation are skipped
/// with a reason, the rest get an invitation. A pending invitation that has
/// already expired is replaced. Emails go out through [`InviteBatch::notify`].
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins and `ValidationError` for an
/// empty or oversized address list, an overlong message or an expiry in the past.
#[tracing::instrument(skip(conn, inviter, request, app), fields(inviter_id = %inviter.id, role = %request.role))]
pub async fn invite(
    conn: &mut AsyncPgConnection,
    inviter: &User,
    calendar_id: uuid::Uuid,
    request: &InviteRequest,
    app: &AppConfig,
) -> ServiceResult<InviteBatch> {
    let access = CalendarAccess::load(conn, calendar_id, inviter.id).await?;
    access.require_admin()?;

    let addresses = parse_addresses(&request.emails)?;
    let message = validate_message(request.message.as_deref())?;
    let now = chrono::Utc::now();
    let expires_at = request
        .expires_at
        .unwrap_or_else(|| now + chrono::Duration::days(app.invitation_ttl_days));
    if expires_at <= now {
        return Err(ServiceError::invalid("Expiry must be in the future"));
    }

    let mut outcomes = Vec::with_capacity(addresses.len());
    for address in addresses {
        let email = match address {
            Address::Valid(email) => email,
            Address::Invalid(email) => {
                outcomes.push(InviteOutcome::Skipped {
                    email,
                    reason: SkipReason::InvalidEmail,
                });
                continue;
            }
        };

        let invitee = query::user::get_user_by_email(conn, &email).await?;
        if let Some(invitee) = &invitee {
            let reason = match CalendarAccess::for_calendar(conn, access.calendar.clone(), invitee.id)
                .await?
                .role
            {
                Role::Owner => Some(SkipReason::AlreadyOwner),
                Role::Admin | Role::Member => Some(SkipReason::AlreadyMember),
                Role::None => None,
            };
            if let Some(reason) = reason {
                outcomes.push(InviteOutcome::Skipped { email, reason });
                continue;
            }
        }

        let token = generate_token();
        let new_invitation = NewCalendarInvitation {
            id: uuid::Uuid::now_v7(),
            calendar_id,
            inviter_id: inviter.id,
            invitee_email: &email,
            invitee_id: invitee.as_ref().map(|u| u.id),
            role: request.role,
            token: &token,
            message,
            expires_at,
        };

        match create_pending(conn, &new_invitation, now).await {
            Ok(invitation) => {
                tracing::info!(invitation_id = %invitation.id, "Invitation created");
                outcomes.push(InviteOutcome::Created {
                    email,
                    invitation,
                    email_sent: false,
                });
            }
            Err(ServiceError::DuplicateInvitation(_)) => {
                outcomes.push(InviteOutcome::Skipped {
                    email,
                    reason: SkipReason::AlreadyInvited,
                });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(InviteBatch {
        calendar: access.calendar,
        outcomes,
    })
}

/// Inserts one invitation, replacing an expired pending one for the same address.
async fn create_pending(
    conn: &mut AsyncPgConnection,
    new_invitation: &NewCalendarInvitation<'_>,
    now: chrono::DateTime<chrono::Utc>,
) -> ServiceResult<CalendarInvitation> {
    with_transaction(conn, |tx| {
        async move {
            let email = new_invitation.invitee_email;
            if let Some(existing) =
                query::invitation::find_pending(tx, new_invitation.calendar_id, email).await?
            {
                if !existing.is_expired_at(now) {
                    return Err(ServiceError::DuplicateInvitation(email.to_string()));
                }
                query::invitation::delete_invitation(tx, existing.calendar_id, existing.id)
                    .await?;
                tracing::debug!(replaced = %existing.id, "Replacing expired invitation");
            }
            let invitation = query::invitation::create_invitation(tx, new_invitation)
                .await
                .map_err(conflict_on(
                    constraint::CALENDAR_INVITATIONS_PENDING_EMAIL,
                    || ServiceError::DuplicateInvitation(email.to_string()),
                ))?;
            Ok(Committed::new(invitation))
        }
        .scope_boxed()
    })
    .await
}

async fn notify_invitee(
    mailer: InvitationMailer<'_>,
    inviter: &User,
    calendar: &Calendar,
    invitation: &CalendarInvitation,
) -> bool {
    let accept_url = mailer
        .app
        .frontend_link(FRONTEND_INVITATION_PATH, &invitation.token);
    let inviter_name = inviter.display_name();
    let message = invitation_email(&InvitationEmail {
        from: mailer.from,
        to: &invitation.invitee_email,
        inviter_name: &inviter_name,
        calendar_name: &calendar.name,
        role: invitation.role.as_str(),
        message: invitation.message.as_deref(),
        accept_url: &accept_url,
        expires_at: invitation.expires_at,
    });
    send_best_effort(mailer.dispatcher, &message).await
}

/// Attaches calendar and inviter names to invitations.
async fn describe(
    conn: &mut AsyncPgConnection,
    invitations: Vec<CalendarInvitation>,
) -> ServiceResult<Vec<InvitationView>> {
    let calendar_ids: Vec<_> = invitations.iter().map(|i| i.calendar_id).collect();
    let inviter_ids: Vec<_> = invitations.iter().map(|i| i.inviter_id).collect();

    let calendars: HashMap<_, _> = query::calendar::get_calendars(conn, &calendar_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let inviters: HashMap<_, _> = query::user::get_users(conn, &inviter_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    let now = chrono::Utc::now();
    Ok(invitations
        .into_iter()
        .map(|invitation| {
            let calendar_name = calendars
                .get(&invitation.calendar_id)
                .cloned()
                .unwrap_or_default();
            let inviter_name = inviters
                .get(&invitation.inviter_id)
                .cloned()
                .unwrap_or_default();
            InvitationView::new(invitation, calendar_name, inviter_name, now)
        })
        .collect())
}

/// ## Summary
/// Lists every invitation of a calendar, newest first.
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins.
#[tracing::instrument(skip(conn))]
pub async fn list_invitations(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
) -> ServiceResult<Vec<InvitationView>> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    let invitations = query::invitation::list_for_calendar(conn, calendar_id).await?;
    describe(conn, invitations).await
}

/// ## Summary
/// Deletes an invitation. Its token stops working.
///
/// ## Errors
/// Returns `AuthorizationError` for non-admins and `NotFound` for unknown invitations.
#[tracing::instrument(skip(conn))]
pub async fn cancel_invitation(
    conn: &mut AsyncPgConnection,
    user_id: uuid::Uuid,
    calendar_id: uuid::Uuid,
    invitation_id: uuid::Uuid,
) -> ServiceResult<()> {
    let access = CalendarAccess::load(conn, calendar_id, user_id).await?;
    access.require_admin()?;

    if query::invitation::delete_invitation(conn, calendar_id, invitation_id).await? == 0 {
        return Err(ServiceError::not_found("Invitation not found"));
    }
    tracing::info!("Invitation cancelled");
    Ok(())
}

/// ## Summary
/// Pending, unexpired invitations addressed to the user's email.
///
/// ## Errors
/// Returns a database error if a lookup fails.
#[tracing::instrument(skip(conn, user), fields(user_id = %user.id))]
pub async fn received_invitations(
    conn: &mut AsyncPgConnection,
    user: &User,
) -> ServiceResult<Vec<InvitationView>> {
    let Some(email) = user.email.as_deref().and_then(normalize_email) else {
        return Ok(Vec::new());
    };
    let invitations = query::invitation::list_received(conn, &email, chrono::Utc::now()).await?;
    describe(conn, invitations).await
}

async fn by_token(conn: &mut AsyncPgConnection, token: &str) -> ServiceResult<CalendarInvitation> {
    query::invitation::get_by_token(conn, token.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found("Invitation not found"))
}

/// ## Summary
/// Shows an invitation to whoever holds its token.
///
/// ## Errors
/// Returns `NotFound` for unknown tokens.
#[tracing::instrument(skip(conn, token))]
pub async fn preview_invitation(
    conn: &mut AsyncPgConnection,
    token: &str,
) -> ServiceResult<InvitationView> {
    let invitation = by_token(conn, token).await?;
    describe(conn, vec![invitation])
        .await?
        .pop()
        .ok_or(ServiceError::InvariantViolation("invitation view missing"))
}

/// ## Summary
/// Accepts an invitation: the user becomes a member with the invited role and
/// the invitation is marked accepted, both or neither.
///
/// An existing member keeps their row; an invitation to `admin` promotes them,
/// an invitation to `member` never demotes.
///
/// ## Errors
/// Returns `NotFound` for unknown tokens, `InvitationAlreadyResolved`,
/// `InvitationExpired`, `AlreadyOwner` for the calendar owner, and
/// `AuthorizationError` when the invitation is bound to another user.
#[tracing::instrument(skip(conn, user, token, app), fields(user_id = %user.id))]
pub async fn accept_invitation(
    conn: &mut AsyncPgConnection,
    user: &User,
    token: &str,
    app: &AppConfig,
) -> ServiceResult<CalendarView> {
    let user_id = user.id;
    let token = token.trim();
    let now = chrono::Utc::now();

    let (calendar, role) = with_transaction(conn, |tx| {
        async move {
            let invitation = by_token(tx, token).await?;
            check_answerable(&invitation, user_id, now, true)?;

            let calendar = query::calendar::get_calendar(tx, invitation.calendar_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Calendar not found"))?;
            if calendar.owner_id == user_id {
                return Err(ServiceError::AlreadyOwner);
            }

            let role = match query::member::find_member(tx, calendar.id, user_id).await? {
                Some(member)
                    if member.role == MemberRole::Member
                        && invitation.role == MemberRole::Admin =>
                {
                    query::member::set_role(tx, calendar.id, user_id, MemberRole::Admin).await?;
                    MemberRole::Admin
                }
                Some(member) => member.role,
                None => {
                    let new_member = NewCalendarMember {
                        id: uuid::Uuid::now_v7(),
                        calendar_id: calendar.id,
                        user_id,
                        role: invitation.role,
                    };
                    query::member::create_member(tx, &new_member)
                        .await
                        .map_err(conflict_on(
                            constraint::CALENDAR_MEMBERS_CALENDAR_USER,
                            || ServiceError::AlreadyMember,
                        ))?
                        .role
                }
            };

            // Conditional on still being pending; loses to a concurrent answer
            let resolved = query::invitation::resolve(
                tx,
                invitation.id,
                InvitationStatus::Accepted,
                user_id,
                now,
            )
            .await?;
            if resolved.is_none() {
                let current = by_token(tx, token).await?;
                return Err(ServiceError::InvitationAlreadyResolved(current.status));
            }

            Ok(Committed::new((calendar, role)))
        }
        .scope_boxed()
    })
    .await?;

    tracing::info!(calendar_id = %calendar.id, role = %role, "Invitation accepted");
    let counts = role_counts_for(conn, &[calendar.id])
        .await?
        .remove(&calendar.id)
        .unwrap_or_default();
    Ok(CalendarView::new(calendar, Role::from(role), counts, app))
}

/// ## Summary
/// Declines a pending invitation. Expired invitations may still be declined.
///
/// ## Errors
/// Returns `NotFound` for unknown tokens, `InvitationAlreadyResolved` when
/// already answered and `AuthorizationError` when bound to another user.
#[tracing::instrument(skip(conn, user, token), fields(user_id = %user.id))]
pub async fn decline_invitation(
    conn: &mut AsyncPgConnection,
    user: &User,
    token: &str,
) -> ServiceResult<CalendarInvitation> {
    let now = chrono::Utc::now();
    let invitation = by_token(conn, token).await?;
    check_answerable(&invitation, user.id, now, false)?;

    let Some(declined) = query::invitation::resolve(
        conn,
        invitation.id,
        InvitationStatus::Declined,
        user.id,
        now,
    )
    .await?
    else {
        let current = by_token(conn, token).await?;
        return Err(ServiceError::InvitationAlreadyResolved(current.status));
    };

    tracing::info!(invitation_id = %declined.id, "Invitation declined");
    Ok(declined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation(status: InvitationStatus, invitee_id: Option<uuid::Uuid>) -> CalendarInvitation {
        let now = chrono::Utc::now();
        CalendarInvitation {
            id: uuid::Uuid::now_v7(),
            calendar_id: uuid::Uuid::now_v7(),
            inviter_id: uuid::Uuid::now_v7(),
            invitee_email: "guest@example.com".to_string(),
            invitee_id,
            role: MemberRole::Member,
            status,
            token: "token".to_string(),
            message: None,
            created_at: now,
            expires_at: now + Duration::days(7),
            responded_at: None,
        }
    }

    #[test]
    fn emails_normalized_and_deduplicated() {
        let raw = vec![
            " Guest@Example.com ".to_string(),
            "guest@example.com".to_string(),
            "other@example.org".to_string(),
        ];
        assert_eq!(
            parse_addresses(&raw).unwrap(),
            vec![
                Address::Valid("guest@example.com".to_string()),
                Address::Valid("other@example.org".to_string()),
            ]
        );
    }

    #[test]
    fn addresses_keep_request_order() {
        let raw = vec![
            "ok@example.com".to_string(),
            "no-at-sign".to_string(),
            "a@b".to_string(),
            "second@example.com".to_string(),
            " two@@example.com ".to_string(),
        ];
        assert_eq!(
            parse_addresses(&raw).unwrap(),
            vec![
                Address::Valid("ok@example.com".to_string()),
                Address::Invalid("no-at-sign".to_string()),
                Address::Invalid("a@b".to_string()),
                Address::Valid("second@example.com".to_string()),
                Address::Invalid("two@@example.com".to_string()),
            ]
        );
    }

    #[test]
    fn request_size_bounded() {
        assert!(matches!(
            parse_addresses(&[]),
            Err(ServiceError::ValidationError(_))
        ));
        let many: Vec<_> = (0..=MAX_INVITES_PER_REQUEST)
            .map(|i| format!("user{i}@example.com"))
            .collect();
        assert!(parse_addresses(&many).is_err());
        assert!(parse_addresses(&many[..MAX_INVITES_PER_REQUEST]).is_ok());
    }

    #[test]
    fn message_trimmed_and_bounded() {
        assert_eq!(validate_message(Some("  hi ")).unwrap(), Some("hi"));
        assert_eq!(validate_message(Some("   ")).unwrap(), None);
        assert!(validate_message(Some(&"m".repeat(MAX_MESSAGE_LENGTH + 1))).is_err());
    }

    #[test]
    fn pending_invitation_answerable() {
        let inv = invitation(InvitationStatus::Pending, None);
        assert!(check_answerable(&inv, uuid::Uuid::now_v7(), chrono::Utc::now(), true).is_ok());
    }

    #[test]
    fn resolved_invitation_not_answerable() {
        for status in [InvitationStatus::Accepted, InvitationStatus::Declined] {
            let inv = invitation(status, None);
            let err = check_answerable(&inv, uuid::Uuid::now_v7(), chrono::Utc::now(), false)
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvitationAlreadyResolved(s) if s == status));
        }
    }

    #[test]
    fn expiry_enforced_on_accept_only() {
        let inv = invitation(InvitationStatus::Pending, None);
        let later = inv.expires_at + Duration::seconds(1);
        let user = uuid::Uuid::now_v7();
        assert!(matches!(
            check_answerable(&inv, user, later, true),
            Err(ServiceError::InvitationExpired)
        ));
        assert!(check_answerable(&inv, user, later, false).is_ok());
        assert!(matches!(
            check_answerable(&inv, user, inv.expires_at, true),
            Err(ServiceError::InvitationExpired)
        ));
        let earlier = inv.expires_at - Duration::seconds(1);
        assert!(check_answerable(&inv, user, earlier, true).is_ok());
    }

    #[test]
    fn bound_invitation_rejects_other_user() {
        let invitee = uuid::Uuid::now_v7();
        let inv = invitation(InvitationStatus::Pending, Some(invitee));
        let now = chrono::Utc::now();
        assert!(check_answerable(&inv, invitee, now, true).is_ok());
        assert!(matches!(
            check_answerable(&inv, uuid::Uuid::now_v7(), now, true),
            Err(ServiceError::AuthorizationError(_))
        ));
    }

    #[test]
    fn outcome_serialization() {
        let skipped = InviteOutcome::Skipped {
            email: "a@example.com".to_string(),
            reason: SkipReason::AlreadyMember,
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "already_member");

        let created = InviteOutcome::Created {
            email: "guest@example.com".to_string(),
            invitation: invitation(InvitationStatus::Pending, None),
            email_sent: false,
        };
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["status"], "created");
        assert_eq!(json["email_sent"], false);
        assert!(json["invitation"].get("token").is_none());
    }

    #[test]
    fn invite_request_defaults_to_member() {
        let request: InviteRequest =
            serde_json::from_value(serde_json::json!({ "emails": ["a@example.com"] })).unwrap();
        assert_eq!(request.role, MemberRole::Member);
        assert!(request.expires_at.is_none());
    }
}
