use axum::http::StatusCode;
use serde_json::json;

use crate::common::{login, register_verified_user, TestContext};

#[tokio::test]
async fn each_login_creates_its_own_session() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    login(&ctx, &email).await;
    login(&ctx, &email).await;
    login(&ctx, &email).await;

    let response = ctx.server.get("/user/me").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["active_sessions"], 3);

    // The listing excludes the session doing the asking.
    let response = ctx.server.get("/user/sessions").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn session_listing_never_exposes_token_material() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    login(&ctx, &email).await;
    login(&ctx, &email).await;

    let response = ctx.server.get("/user/sessions").await;
    let body: serde_json::Value = response.json();
    for session in body["data"].as_array().unwrap() {
        assert!(session.get("refresh_token_hash").is_none());
        assert!(session["id"].as_str().is_some());
    }
}

#[tokio::test]
async fn terminate_others_keeps_only_the_current_session() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    login(&ctx, &email).await;
    login(&ctx, &email).await;
    login(&ctx, &email).await;

    let response = ctx.server.post("/user/sessions/terminate-others").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["msg"], "Terminated 2 other session(s)");

    let response = ctx.server.get("/user/me").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["active_sessions"], 1);

    // The current session keeps working.
    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn revoking_a_listed_session_deactivates_it() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    login(&ctx, &email).await;
    login(&ctx, &email).await;

    let response = ctx.server.get("/user/sessions").await;
    let body: serde_json::Value = response.json();
    let other_sid = body["data"][0]["id"].as_str().unwrap().to_string();

    let response = ctx
        .server
        .post("/user/sessions/revoke")
        .json(&json!({ "sid": other_sid }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = ctx.server.get("/user/me").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["active_sessions"], 1);
}

#[tokio::test]
async fn revoking_another_users_session_does_nothing() {
    let ctx = TestContext::new().await;

    let alice = register_verified_user(&ctx).await;
    login(&ctx, &alice).await;
    let response = ctx.server.get("/user/me").await;
    let body: serde_json::Value = response.json();
    let alice_sid = body["session"]["id"].as_str().unwrap().to_string();

    let bob = register_verified_user(&ctx).await;
    login(&ctx, &bob).await;

    // Bob names Alice's session id; the revocation is scoped to Bob and
    // misses.
    let response = ctx
        .server
        .post("/user/sessions/revoke")
        .json(&json!({ "sid": alice_sid }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    use secure_auth::modules::auth::interface::{SessionRepository, UserRepository};
    let alice_user = ctx.users.find_by_email(&alice).await.unwrap().unwrap();
    let active = ctx.sessions.count_active(&alice_user.id).await.unwrap();
    assert_eq!(active, 1);
}
