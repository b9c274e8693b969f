use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use serde_json::json;

use crate::common::{login, register_verified_user, TestContext};
use secure_auth::services::cookies::{ACCESS_COOKIE, REFRESH_COOKIE, SESSION_COOKIE};

#[tokio::test]
async fn refresh_rotates_both_tokens() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    let logged_in = login(&ctx, &email).await;

    let old_refresh = logged_in.cookie(REFRESH_COOKIE).value().to_string();
    let old_access = logged_in.cookie(ACCESS_COOKIE).value().to_string();

    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["access_token"].as_str().is_some());

    assert_ne!(response.cookie(REFRESH_COOKIE).value(), old_refresh);
    assert_ne!(response.cookie(ACCESS_COOKIE).value(), old_access);

    // The rotated pair keeps working.
    let response = ctx.server.get("/user/me").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_cookies_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn replaying_a_rotated_refresh_token_burns_the_session() {
    let mut ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    let logged_in = login(&ctx, &email).await;

    let stolen = logged_in.cookie(REFRESH_COOKIE).value().to_string();
    let sid = logged_in.cookie(SESSION_COOKIE).value().to_string();

    // Legitimate client rotates past the captured token.
    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let current = response.cookie(REFRESH_COOKIE).value().to_string();

    // Attacker replays the stale token: valid signature, wrong hash.
    ctx.server.clear_cookies();
    ctx.server
        .add_cookie(Cookie::new(REFRESH_COOKIE, stolen));
    ctx.server.add_cookie(Cookie::new(SESSION_COOKIE, sid.clone()));

    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["msg"], "Refresh token compromised");

    // The session is gone for the legitimate holder too.
    ctx.server.clear_cookies();
    ctx.server
        .add_cookie(Cookie::new(REFRESH_COOKIE, current));
    ctx.server.add_cookie(Cookie::new(SESSION_COOKIE, sid));

    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["msg"], "Session not found");
}

#[tokio::test]
async fn refresh_fails_for_a_revoked_session() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    let logged_in = login(&ctx, &email).await;

    let sid = logged_in.cookie(SESSION_COOKIE).value().to_string();

    let response = ctx
        .server
        .post("/user/sessions/revoke")
        .json(&json!({ "sid": sid }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}
