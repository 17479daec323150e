#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Share links, joining and role changes.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, TestRequest};

#[test_log::test(tokio::test)]
async fn joined_member_needs_admin_for_tags() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let member = app.register("member@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Team").await;
    app.join_via_link(&owner, &member, &calendar_id).await;

    let tags_path = format!("/api/calendars/{calendar_id}/tags");
    let tags = app
        .send(TestRequest::get(&tags_path).auth(&member))
        .await
        .assert_status(StatusCode::OK);
    let tag_id = tags.body[0]["id"].clone();
    let rename = json!({ "tags": [{ "id": tag_id, "name": "Sprint" }] });

    let _ = app
        .send(TestRequest::put(&tags_path).auth(&member).json(rename.clone()))
        .await
        .assert_error(StatusCode::FORBIDDEN, "authorization_error");

    let promoted = app
        .send(
            TestRequest::post(&format!("/api/calendars/{calendar_id}/change-role"))
                .auth(&owner)
                .json(json!({ "user_id": member.user_id, "role": "admin" })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(promoted.body["role"], "admin");

    let _ = app
        .send(TestRequest::put(&tags_path).auth(&member).json(rename))
        .await
        .assert_status(StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn joining_twice_conflicts() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let member = app.register("member@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Team").await;
    app.join_via_link(&owner, &member, &calendar_id).await;

    let link = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}/share-link")).auth(&member))
        .await
        .assert_status(StatusCode::OK);
    let token = link.str_at("/share_token");
    assert!(link.str_at("/share_url").ends_with(&token));

    let _ = app
        .send(
            TestRequest::post("/api/calendars/join")
                .auth(&member)
                .json(json!({ "token": token })),
        )
        .await
        .assert_error(StatusCode::CONFLICT, "conflict");
    let _ = app
        .send(
            TestRequest::post("/api/calendars/join")
                .auth(&owner)
                .json(json!({ "share_token": token })),
        )
        .await
        .assert_error(StatusCode::CONFLICT, "conflict");
}

#[test_log::test(tokio::test)]
async fn regenerate_invalidates_old_link() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let guest = app.register("guest@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Book club").await;
    let link_path = format!("/api/calendars/{calendar_id}/share-link");

    let old = app
        .send(TestRequest::get(&link_path).auth(&owner))
        .await
        .assert_status(StatusCode::OK)
        .str_at("/share_token");
    let new = app
        .send(TestRequest::post(&format!("{link_path}/regenerate")).auth(&owner))
        .await
        .assert_status(StatusCode::OK)
        .str_at("/share_token");
    assert_ne!(old, new);

    let _ = app
        .send(
            TestRequest::post("/api/calendars/join")
                .auth(&guest)
                .json(json!({ "token": old })),
        )
        .await
        .assert_error(StatusCode::NOT_FOUND, "not_found");

    let preview = app
        .send(TestRequest::get(&format!("/api/calendars/share?token={new}")).auth(&guest))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(preview.str_at("/name"), "Book club");
    assert_eq!(preview.body["already_joined"], false);
    assert_eq!(preview.body["member_count"], 1);

    let joined = app
        .send(
            TestRequest::post("/api/calendars/join")
                .auth(&guest)
                .json(json!({ "token": new })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(joined.body["role"], "member");
    assert_eq!(joined.body["member_count"], 2);
}

#[test_log::test(tokio::test)]
async fn only_owner_manages_admins() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let first = app.register("first@example.com").await;
    let second = app.register("second@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Ops").await;
    app.join_via_link(&owner, &first, &calendar_id).await;
    app.join_via_link(&owner, &second, &calendar_id).await;

    let role_path = format!("/api/calendars/{calendar_id}/change-role");
    for user in [&first, &second] {
        let _ = app
            .send(
                TestRequest::post(&role_path)
                    .auth(&owner)
                    .json(json!({ "user_id": user.user_id, "role": "admin" })),
            )
            .await
            .assert_status(StatusCode::OK);
    }

    let _ = app
        .send(
            TestRequest::delete(&format!(
                "/api/calendars/{calendar_id}/members/{}",
                second.user_id
            ))
            .auth(&first),
        )
        .await
        .assert_error(StatusCode::FORBIDDEN, "authorization_error");

    let _ = app
        .send(
            TestRequest::delete(&format!(
                "/api/calendars/{calendar_id}/members/{}",
                owner.user_id
            ))
            .auth(&first),
        )
        .await
        .assert_error(StatusCode::FORBIDDEN, "authorization_error");

    let _ = app
        .send(
            TestRequest::delete(&format!(
                "/api/calendars/{calendar_id}/members/{}",
                second.user_id
            ))
            .auth(&owner),
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
}
