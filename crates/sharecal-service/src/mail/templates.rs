//! Message bodies.

use super::EmailMessage;

/// Values interpolated into an invitation email.
#[derive(Debug, Clone, Copy)]
pub struct InvitationEmail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub inviter_name: &'a str,
    pub calendar_name: &'a str,
    pub role: &'a str,
    pub message: Option<&'a str>,
    pub accept_url: &'a str,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// ## Summary
/// Renders the HTML and plain-text bodies of an invitation.
#[must_use]
pub fn invitation_email(ctx: &InvitationEmail<'_>) -> EmailMessage {
    let subject = format!(
        "{} invited you to the '{}' calendar",
        ctx.inviter_name, ctx.calendar_name
    );
    let expires = ctx.expires_at.format("%Y-%m-%d %H:%M UTC");

    let mut text = format!(
        "{} invited you to join the '{}' calendar as {}.\n\n",
        ctx.inviter_name, ctx.calendar_name, ctx.role
    );
    if let Some(message) = ctx.message.filter(|m| !m.trim().is_empty()) {
        text.push_str(&format!("Message: {}\n\n", message.trim()));
    }
    text.push_str(&format!(
        "Accept the invitation: {}\n\nThis invitation expires on {expires}.\n",
        ctx.accept_url
    ));

    let message_html = ctx
        .message
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!("<blockquote>{}</blockquote>", escape_html(m.trim())))
        .unwrap_or_default();
    let html = format!(
        "<p><strong>{inviter}</strong> invited you to join the <strong>{calendar}</strong> \
         calendar as {role}.</p>{message_html}\
         <p><a href=\"{url}\">Accept invitation</a></p>\
         <p>This invitation expires on {expires}.</p>",
        inviter = escape_html(ctx.inviter_name),
        calendar = escape_html(ctx.calendar_name),
        role = escape_html(ctx.role),
        url = escape_html(ctx.accept_url),
    );

    EmailMessage {
        from: ctx.from.to_string(),
        to: ctx.to.to_string(),
        subject,
        html,
        text,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
