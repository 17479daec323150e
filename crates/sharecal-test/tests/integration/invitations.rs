#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Email invitations: sending, skipping, accepting, declining and expiry.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, TestRequest};

#[test_log::test(tokio::test)]
async fn invite_and_accept() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let invitee = app.register("invitee@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Family").await;
    let invite_path = format!("/api/calendars/{calendar_id}/invitations");

    let sent = app
        .send(TestRequest::post(&invite_path).auth(&owner).json(json!({
            "emails": ["Invitee@Example.com", "not-an-email"],
            "role": "admin",
            "message": "Join us",
        })))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(sent.body[0]["status"], "created");
    assert_eq!(sent.body[0]["email"], "invitee@example.com");
    assert_eq!(sent.body[0]["email_sent"], true);
    assert_eq!(sent.body[1]["status"], "skipped");
    assert_eq!(sent.body[1]["reason"], "invalid_email");

    let outbox = app.mailer.sent();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, "invitee@example.com");
    assert!(outbox[0].text.contains("Join us"));

    let again = app
        .send(
            TestRequest::post(&invite_path)
                .auth(&owner)
                .json(json!({ "emails": ["invitee@example.com"] })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(again.body[0]["reason"], "already_invited");

    let received = app
        .send(TestRequest::get("/api/invitations/received").auth(&invitee))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(received.array().len(), 1);
    assert_eq!(received.body[0]["calendar_name"], "Family");
    assert!(received.body[0].get("token").is_none());

    let token = app.invitation_token("invitee@example.com");
    let accepted = app
        .send(TestRequest::post(&format!("/api/invitations/{token}/accept")).auth(&invitee))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(accepted.body["role"], "admin");
    assert_eq!(accepted.str_at("/id"), calendar_id);

    let _ = app
        .send(TestRequest::post(&format!("/api/invitations/{token}/accept")).auth(&invitee))
        .await
        .assert_error(StatusCode::CONFLICT, "state_error");

    let member_again = app
        .send(
            TestRequest::post(&invite_path)
                .auth(&owner)
                .json(json!({ "emails": ["invitee@example.com"] })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(member_again.body[0]["reason"], "already_member");
}

#[test_log::test(tokio::test)]
async fn expired_invitation_cannot_be_accepted() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let late = app.register("late@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Trips").await;

    let _ = app
        .send(
            TestRequest::post(&format!("/api/calendars/{calendar_id}/invitations"))
                .auth(&owner)
                .json(json!({ "emails": ["late@example.com"] })),
        )
        .await
        .assert_status(StatusCode::CREATED);

    let expired = app
        .db
        .execute("UPDATE calendar_invitations SET expires_at = now() - interval '1 day'")
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let token = app.invitation_token("late@example.com");
    let preview = app
        .send(TestRequest::get(&format!("/api/invitations/{token}")).auth(&late))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(preview.body["is_expired"], true);

    let _ = app
        .send(TestRequest::post(&format!("/api/invitations/{token}/accept")).auth(&late))
        .await
        .assert_error(StatusCode::CONFLICT, "state_error");

    // An expired pending invitation does not block a fresh one
    let reinvite = app
        .send(
            TestRequest::post(&format!("/api/calendars/{calendar_id}/invitations"))
                .auth(&owner)
                .json(json!({ "emails": ["late@example.com"] })),
        )
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(reinvite.body[0]["status"], "created");
}

#[test_log::test(tokio::test)]
async fn decline_and_cancel() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let invitee = app.register("busy@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Choir").await;
    let invite_path = format!("/api/calendars/{calendar_id}/invitations");

    let _ = app
        .send(
            TestRequest::post(&invite_path)
                .auth(&owner)
                .json(json!({ "emails": ["busy@example.com", "nobody@example.com"] })),
        )
        .await
        .assert_status(StatusCode::CREATED);

    let token = app.invitation_token("busy@example.com");
    let declined = app
        .send(TestRequest::post(&format!("/api/invitations/{token}/decline")).auth(&invitee))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(declined.body["status"], "declined");

    let _ = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}")).auth(&invitee))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let listed = app
        .send(TestRequest::get(&invite_path).auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    let pending = listed
        .array()
        .iter()
        .find(|i| i["invitee_email"] == "nobody@example.com")
        .expect("pending invitation listed")
        .clone();

    let _ = app
        .send(
            TestRequest::delete(&format!("{invite_path}/{}", pending["id"].as_str().unwrap()))
                .auth(&invitee),
        )
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let _ = app
        .send(
            TestRequest::delete(&format!("{invite_path}/{}", pending["id"].as_str().unwrap()))
                .auth(&owner),
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[test_log::test(tokio::test)]
async fn failed_delivery_keeps_the_invitation() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let guest = app.register("guest@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Book club").await;

    app.mailer.set_failing(true);
    let sent = app
        .send(
            TestRequest::post(&format!("/api/calendars/{calendar_id}/invitations"))
                .auth(&owner)
                .json(json!({ "emails": ["guest@example.com"] })),
        )
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(sent.body[0]["status"], "created");
    assert_eq!(sent.body[0]["email_sent"], false);
    assert!(app.mailer.sent().is_empty());

    let received = app
        .send(TestRequest::get("/api/invitations/received").auth(&guest))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(received.array().len(), 1);
    assert_eq!(received.body[0]["calendar_name"], "Book club");
}
