use axum::http::StatusCode;

use crate::common::{login, register_verified_user, TestContext};

#[tokio::test]
async fn me_returns_the_user_and_the_calling_session() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    login(&ctx, &email).await;

    let response = ctx.server.get("/user/me").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["is_2fa"], false);
    assert_eq!(body["active_sessions"], 1);
    assert_eq!(body["session"]["is_active"], true);
    // Credential material stays out of the payload.
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["session"].get("refresh_token_hash").is_none());
}

#[tokio::test]
async fn me_reflects_the_last_login_timestamp() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    login(&ctx, &email).await;

    let response = ctx.server.get("/user/me").await;
    let body: serde_json::Value = response.json();
    assert!(body["user"]["last_login_at"].as_str().is_some());
}

#[tokio::test]
async fn me_fails_once_the_session_is_revoked() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    login(&ctx, &email).await;

    let response = ctx.server.get("/user/me").await;
    let body: serde_json::Value = response.json();
    let sid = body["session"]["id"].as_str().unwrap().to_string();

    ctx.server
        .post("/user/sessions/revoke")
        .json(&serde_json::json!({ "sid": sid }))
        .await;

    // The access token is still signed and unexpired, but the session
    // behind it is gone.
    let response = ctx.server.get("/user/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}
