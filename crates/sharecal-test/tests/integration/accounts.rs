#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Registration, login, token lifecycle and linked social accounts.

use salvo::http::StatusCode;
use serde_json::json;

use crate::helpers::{Session, TestApp, TestRequest};

#[test_log::test(tokio::test)]
async fn register_login_and_me() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let alice = app.register("Alice@Example.com").await;

    let login = app
        .send(TestRequest::post("/api/auth/login").json(json!({
            "email": "alice@example.com",
            "password": "correct-horse-battery",
        })))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(login.str_at("/user/id"), alice.user_id);

    let me = app
        .send(TestRequest::get("/api/auth/me").auth(&alice))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(me.str_at("/email"), "alice@example.com");
    assert_eq!(me.str_at("/username"), "alice");
    assert_eq!(me.body["has_password"], true);
    assert!(me.body.get("password_hash").is_none());
}

#[test_log::test(tokio::test)]
async fn duplicate_email_conflicts() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    app.register("bob@example.com").await;
    let _ = app
        .send(TestRequest::post("/api/auth/register").json(json!({
            "email": "BOB@example.com",
            "password": "another-password",
            "password2": "another-password",
        })))
        .await
        .assert_error(StatusCode::CONFLICT, "conflict");

    let check = app
        .send(TestRequest::get("/api/auth/check-email?email=bob@example.com"))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(check.body["exists"], true);
}

#[test_log::test(tokio::test)]
async fn wrong_password_is_rejected() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    app.register("carol@example.com").await;
    let _ = app
        .send(TestRequest::post("/api/auth/login").json(json!({
            "login": "carol@example.com",
            "password": "not-the-password",
        })))
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "authentication_error");
}

#[test_log::test(tokio::test)]
async fn protected_routes_need_a_token() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let _ = app
        .send(TestRequest::get("/api/auth/me"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    let _ = app
        .send(TestRequest::get("/api/calendars").bearer("garbage"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn logout_revokes_refresh_token() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let dave = app.register("dave@example.com").await;

    let refreshed = app
        .send(TestRequest::post("/api/auth/token/refresh").json(json!({ "refresh": dave.refresh })))
        .await
        .assert_status(StatusCode::OK);
    assert!(!refreshed.str_at("/access").is_empty());

    let _ = app
        .send(
            TestRequest::post("/api/auth/logout")
                .auth(&dave)
                .json(json!({ "refresh": dave.refresh })),
        )
        .await
        .assert_status(StatusCode::OK);

    let _ = app
        .send(TestRequest::post("/api/auth/token/refresh").json(json!({ "refresh": dave.refresh })))
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "authentication_error");
}

#[test_log::test(tokio::test)]
async fn social_login_links_verified_email() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let erin = app.register("erin@example.com").await;

    let social = app
        .send(TestRequest::post("/api/auth/social-login").json(json!({
            "provider": "kakao",
            "access_token": "k-100:erin@example.com",
        })))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(social.str_at("/user/id"), erin.user_id);
    assert_eq!(social.body["is_new_user"], false);

    let accounts = app
        .send(TestRequest::get("/api/auth/social-accounts").auth(&erin))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(accounts.array().len(), 1);
    assert_eq!(accounts.body[0]["provider"], "kakao");

    let _ = app
        .send(TestRequest::post("/api/auth/social-login").json(json!({
            "provider": "kakao",
            "access_token": "bad-token",
        })))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn last_login_method_cannot_be_disconnected() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let social = app
        .send(TestRequest::post("/api/auth/social-login").json(json!({
            "provider": "kakao",
            "access_token": "k-200",
        })))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(social.body["is_new_user"], true);
    let frank = Session::from_body(&social.body);

    let _ = app
        .send(TestRequest::delete("/api/auth/social-accounts/kakao").auth(&frank))
        .await
        .assert_error(StatusCode::CONFLICT, "state_error");

    let _ = app
        .send(
            TestRequest::post("/api/auth/password/change")
                .auth(&frank)
                .json(json!({
                    "new_password": "fresh-password-1",
                    "new_password2": "fresh-password-1",
                })),
        )
        .await
        .assert_status(StatusCode::OK);

    let _ = app
        .send(TestRequest::delete("/api/auth/social-accounts/kakao").auth(&frank))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let _ = app
        .send(TestRequest::delete("/api/auth/social-accounts/kakao").auth(&frank))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn profile_update_trims_and_clears() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let gina = app.register("gina@example.com").await;
    let updated = app
        .send(TestRequest::patch("/api/auth/me").auth(&gina).json(json!({
            "first_name": "  Gina ",
            "phone_number": "010-1234-5678",
        })))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(updated.str_at("/first_name"), "Gina");
    assert_eq!(updated.str_at("/phone_number"), "010-1234-5678");

    let cleared = app
        .send(
            TestRequest::patch("/api/auth/me")
                .auth(&gina)
                .json(json!({ "phone_number": null })),
        )
        .await
        .assert_status(StatusCode::OK);
    assert!(cleared.body["phone_number"].is_null());
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_first_social_logins_share_one_user() {
    let Some(app) = TestApp::start().await else {
        return;
    };

    let logins = (0..8).map(|_| {
        app.send(TestRequest::post("/api/auth/social-login").json(json!({
            "provider": "kakao",
            "access_token": "k-777:fresh@example.com",
        })))
    });
    let responses = futures::future::join_all(logins).await;

    let mut user_ids = Vec::new();
    let mut created = 0;
    for res in responses {
        let res = res.assert_status(StatusCode::OK);
        user_ids.push(res.str_at("/user/id"));
        if res.body["is_new_user"] == true {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    user_ids.dedup();
    assert_eq!(user_ids.len(), 1, "logins resolved to different users");

    let session = Session::from_body(
        &app.send(TestRequest::post("/api/auth/social-login").json(json!({
            "provider": "kakao",
            "access_token": "k-777:fresh@example.com",
        })))
        .await
        .assert_status(StatusCode::OK)
        .body,
    );
    let accounts = app
        .send(TestRequest::get("/api/auth/social-accounts").auth(&session))
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(accounts.array().len(), 1);
}
