use axum::http::StatusCode;
use serde_json::json;

use crate::common::{login, register_verified_user, test_email, test_password, TestContext};

const NEW_PASSWORD: &str = "brand-new-Passw0rd";

#[tokio::test]
async fn full_reset_flow_changes_the_password_and_revokes_sessions() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    login(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/forgot-password")
        .json(&json!({ "email": &email }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let otp = ctx.wait_for_otp(&email).await;

    // Preflight leaves the code consumable.
    let response = ctx
        .server
        .post("/auth/verify-reset-otp")
        .json(&json!({ "email": &email, "otp": &otp }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({ "email": &email, "otp": &otp, "new_password": NEW_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Every pre-reset session is dead.
    let response = ctx.server.post("/auth/refresh").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Old password out, new password in.
    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({ "email": &email, "password": test_password() }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({ "email": &email, "password": NEW_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    ctx.wait_for_mail("PASSWORD_RESET_ALERT", &email).await;
}

#[tokio::test]
async fn forgot_password_does_not_reveal_whether_the_email_exists() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    let known = ctx
        .server
        .post("/auth/forgot-password")
        .json(&json!({ "email": &email }))
        .await;
    let unknown = ctx
        .server
        .post("/auth/forgot-password")
        .json(&json!({ "email": test_email() }))
        .await;

    assert_eq!(known.status_code(), StatusCode::OK);
    assert_eq!(unknown.status_code(), StatusCode::OK);
    let a: serde_json::Value = known.json();
    let b: serde_json::Value = unknown.json();
    assert_eq!(a["msg"], b["msg"]);
}

#[tokio::test]
async fn reset_otp_is_single_use() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    ctx.server
        .post("/auth/forgot-password")
        .json(&json!({ "email": &email }))
        .await;
    let otp = ctx.wait_for_otp(&email).await;

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({ "email": &email, "otp": &otp, "new_password": NEW_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/reset-password")
        .json(&json!({ "email": &email, "otp": &otp, "new_password": "another-Passw0rd!" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;
    login(&ctx, &email).await;

    let response = ctx
        .server
        .put("/auth/change-password")
        .json(&json!({ "password": "not-the-current-1", "new_password": NEW_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .server
        .put("/auth/change-password")
        .json(&json!({ "password": test_password(), "new_password": NEW_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({ "email": &email, "password": NEW_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}
