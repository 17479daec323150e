#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Calendar lifecycle, default tags and membership.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::{TestApp, TestRequest};

#[test_log::test(tokio::test)]
async fn new_calendar_gets_default_tags() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Family").await;

    let tags = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}/tags")).auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(tags.array().len(), 10);
    assert_eq!(tags.body[0]["color"], "#FF6B6B");
    assert_eq!(tags.body[0]["order"], 0);

    let view = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}")).auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(view.body["role"], "owner");
    assert_eq!(view.body["is_owner"], true);
    assert_eq!(view.body["member_count"], 1);
    assert!(view.body.get("share_token").is_none());
}

#[test_log::test(tokio::test)]
async fn reset_tags_is_idempotent() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Work").await;
    let path = format!("/api/calendars/{calendar_id}/tags");

    let _ = app
        .send(
            TestRequest::post(&path)
                .auth(&owner)
                .json(json!({ "name": "Deadlines", "color": "#abcdef" })),
        )
        .await
        .assert_status(StatusCode::CREATED);

    let _ = app
        .send(
            TestRequest::post(&path)
                .auth(&owner)
                .json(json!({ "name": "Again", "color": "#ABCDEF" })),
        )
        .await
        .assert_error(StatusCode::CONFLICT, "conflict");

    for _ in 0..2 {
        let reset = app
            .send(TestRequest::post(&format!("{path}/reset")).auth(&owner))
            .await
            .assert_status(StatusCode::OK);
        assert_eq!(reset.array().len(), 10);
    }
}

#[test_log::test(tokio::test)]
async fn bulk_tag_update_is_all_or_nothing() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Hobbies").await;
    let path = format!("/api/calendars/{calendar_id}/tags");

    let tags = app.send(TestRequest::get(&path).auth(&owner)).await;
    let first = tags.body[0]["id"].clone();
    let second = tags.body[1]["id"].clone();

    let _ = app
        .send(TestRequest::put(&path).auth(&owner).json(json!({
            "tags": [
                { "id": first, "name": "Renamed" },
                { "id": second, "color": "#FF6B6B" },
            ]
        })))
        .await
        .assert_error(StatusCode::CONFLICT, "conflict");

    let unchanged = app.send(TestRequest::get(&path).auth(&owner)).await;
    assert_ne!(unchanged.body[0]["name"], "Renamed");

    let updated = app
        .send(
            TestRequest::put(&path)
                .auth(&owner)
                .json(json!([{ "id": first, "name": "Renamed" }])),
        )
        .await
        .assert_status(StatusCode::OK);
    assert!(updated.array().iter().any(|t| t["name"] == "Renamed"));
}

#[test_log::test(tokio::test)]
async fn bulk_tag_update_can_swap_colors() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Colors").await;
    let path = format!("/api/calendars/{calendar_id}/tags");

    let tags = app.send(TestRequest::get(&path).auth(&owner)).await;
    let (first, first_color) = (tags.str_at("/0/id"), tags.str_at("/0/color"));
    let (second, second_color) = (tags.str_at("/1/id"), tags.str_at("/1/color"));

    let swapped = app
        .send(TestRequest::put(&path).auth(&owner).json(json!([
            { "id": first, "color": second_color },
            { "id": second, "color": first_color },
        ])))
        .await
        .assert_status(StatusCode::OK);
    let color_of = |id: &str| {
        swapped
            .array()
            .iter()
            .find(|t| t["id"] == id)
            .map(|t| t["color"].as_str().unwrap().to_string())
            .unwrap()
    };
    assert_eq!(color_of(&first), second_color);
    assert_eq!(color_of(&second), first_color);
    assert!(swapped.array().iter().all(|t| t["color"].as_str().unwrap().starts_with('#')));
}

#[test_log::test(tokio::test)]
async fn members_list_puts_owner_first() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let member = app.register("member@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Club").await;
    app.join_via_link(&owner, &member, &calendar_id).await;

    let members = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}/members")).auth(&member))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(members.array().len(), 2);
    assert_eq!(members.body[0]["user_id"], owner.user_id.as_str());
    assert_eq!(members.body[0]["role"], "owner");
    assert_eq!(members.body[1]["role"], "member");

    let _ = app
        .send(TestRequest::delete(&format!("/api/calendars/{calendar_id}")).auth(&member))
        .await
        .assert_error(StatusCode::FORBIDDEN, "authorization_error");

    let _ = app
        .send(TestRequest::post(&format!("/api/calendars/{calendar_id}/leave")).auth(&owner))
        .await
        .assert_error(StatusCode::CONFLICT, "state_error");

    let _ = app
        .send(TestRequest::post(&format!("/api/calendars/{calendar_id}/leave")).auth(&member))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let _ = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}")).auth(&member))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn outsiders_cannot_see_calendars() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let stranger = app.register("stranger@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Private").await;

    let _ = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}")).auth(&stranger))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let list = app
        .send(TestRequest::get("/api/calendars").auth(&stranger))
        .await
        .assert_status(StatusCode::OK);
    assert!(list.array().is_empty());

    let check = app
        .send(TestRequest::get("/api/calendars/check").auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(check.body["has_calendars"], true);
    assert_eq!(check.body["owned_count"], 1);
}

#[test_log::test(tokio::test)]
async fn owner_deletes_calendar() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Temporary").await;

    let _ = app
        .send(TestRequest::delete(&format!("/api/calendars/{calendar_id}")).auth(&owner))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let _ = app
        .send(TestRequest::get(&format!("/api/calendars/{calendar_id}")).auth(&owner))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn seeding_an_already_seeded_calendar_adds_nothing() {
    use sharecal_test::service::calendar::tag::seed_default_tags;

    let Some(app) = TestApp::start().await else {
        return;
    };

    let owner = app.register("owner@example.com").await;
    let calendar_id = app.create_calendar(&owner, "Garden").await;
    let id = uuid::Uuid::parse_str(&calendar_id).unwrap();
    let tags_path = format!("/api/calendars/{calendar_id}/tags");

    let mut conn = app.db.get_conn().await.unwrap();
    assert_eq!(seed_default_tags(&mut conn, id).await.unwrap(), 0);
    assert_eq!(seed_default_tags(&mut conn, id).await.unwrap(), 0);
    drop(conn);

    let tags = app
        .send(TestRequest::get(&tags_path).auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(tags.array().len(), 10);

    // A calendar with some tags left is not topped up either
    let first = tags.str_at("/0/id");
    let _ = app
        .send(TestRequest::delete(&format!("{tags_path}/{first}")).auth(&owner))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let mut conn = app.db.get_conn().await.unwrap();
    assert_eq!(seed_default_tags(&mut conn, id).await.unwrap(), 0);
    drop(conn);

    let tags = app
        .send(TestRequest::get(&tags_path).auth(&owner))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(tags.array().len(), 9);
}
