#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Events, their tags and completion state.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, TestRequest};

const UNTAGGED: &str = "#95A5A6";

#[test_log::test(tokio::test)]
async fn event_range_is_validated() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Work").await;

    let instant = app
        .send(TestRequest::post("/api/events").auth(&owner).json(json!({
            "calendar_id": calendar_id,
            "title": "Deploy",
            "start_date": "2026-03-02T09:00:00Z",
            "end_date": "2026-03-02T09:00:00Z",
        })))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(instant.str_at("/color"), UNTAGGED);
    assert!(instant.body["tag_name"].is_null());
    assert_eq!(instant.body["can_delete"], true);

    let _ = app
        .send(TestRequest::post("/api/events").auth(&owner).json(json!({
            "calendar_id": calendar_id,
            "title": "Backwards",
            "start_date": "2026-03-02T10:00:00Z",
            "end_date": "2026-03-02T09:00:00Z",
        })))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "validation_error");

    let _ = app
        .send(TestRequest::post("/api/events").auth(&owner).json(json!({
            "calendar_id": calendar_id,
            "title": "   ",
            "start_date": "2026-03-02T09:00:00Z",
            "end_date": "2026-03-02T10:00:00Z",
        })))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "validation_error");
}

#[test_log::test(tokio::test)]
async fn deleting_a_tag_untags_its_events() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Home").await;
    let tags = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}/tags")).auth(&owner))
        .await;
    let tag_id = tags.str_at("/0/id");

    let event = app
        .send(TestRequest::post("/api/events").auth(&owner).json(json!({
            "calendar_id": calendar_id,
            "tag_id": tag_id,
            "title": "Dinner",
            "start_date": "2026-03-05T18:00:00Z",
            "end_date": "2026-03-05T20:00:00Z",
        })))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(event.str_at("/color"), "#FF6B6B");
    let event_id = event.str_at("/id");

    let _ = app
        .send(
            TestRequest::delete(&format!("/api/calendars/{calendar_id}/tags/{tag_id}"))
                .auth(&owner),
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let after = app
        .send(TestRequest::get(&format!("/api/events/{event_id}")).auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    assert!(after.body["tag_id"].is_null());
    assert_eq!(after.str_at("/color"), UNTAGGED);
}

#[test_log::test(tokio::test)]
async fn tags_from_other_calendars_are_rejected() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let first = app.create_calendar(&owner, "First").await;
    let second = app.create_calendar(&owner, "Second").await;
    let foreign_tag = app
        .send(TestRequest::get(&format!("/api/calendars/{second}/tags")).auth(&owner))
        .await
        .str_at("/0/id");

    let _ = app
        .send(TestRequest::post("/api/events").auth(&owner).json(json!({
            "calendar_id": first,
            "tag_id": foreign_tag,
            "title": "Mixed",
            "start_date": "2026-03-05T18:00:00Z",
            "end_date": "2026-03-05T19:00:00Z",
        })))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "validation_error");
}

#[test_log::test(tokio::test)]
async fn completion_and_windowed_listing() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let member = app.register("member@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Chores").await;
    app.join_via_link(&owner, &member, &calendar_id).await;

    let march = app
        .send(TestRequest::post("/api/events").auth(&owner).json(json!({
            "calendar_id": calendar_id,
            "title": "Laundry",
            "start_date": "2026-03-10T08:00:00Z",
            "end_date": "2026-03-10T09:00:00Z",
        })))
        .await
        .assert_status(StatusCode::CREATED);
    let march_id = march.str_at("/id");
    let _ = app
        .send(TestRequest::post("/api/events").auth(&member).json(json!({
            "calendar_id": calendar_id,
            "title": "Groceries",
            "start_date": "2026-04-10T08:00:00Z",
            "end_date": "2026-04-10T09:00:00Z",
        })))
        .await
        .assert_status(StatusCode::CREATED);

    let window = app
        .send(
            TestRequest::get(&format!(
                "/api/calendars/{calendar_id}/events?from=2026-03-01T00:00:00Z&to=2026-03-31T00:00:00Z"
            ))
            .auth(&member),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(window.array().len(), 1);
    assert_eq!(window.body[0]["title"], "Laundry");
    assert_eq!(window.body[0]["can_delete"], false);

    let all = app
        .send(TestRequest::get("/api/events").auth(&member))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(all.array().len(), 2);

    let done = app
        .send(
            TestRequest::patch(&format!("/api/events/{march_id}"))
                .auth(&member)
                .json(json!({ "is_completed": true })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(done.body["is_completed"], true);
    assert!(done.body["completed_at"].is_string());

    let undone = app
        .send(
            TestRequest::patch(&format!("/api/events/{march_id}"))
                .auth(&member)
                .json(json!({ "is_completed": false })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert!(undone.body["completed_at"].is_null());

    let _ = app
        .send(TestRequest::delete(&format!("/api/events/{march_id}")).auth(&member))
        .await
        .assert_error(StatusCode::FORBIDDEN, "authorization_error");
    let _ = app
        .send(TestRequest::delete(&format!("/api/events/{march_id}")).auth(&owner))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}
