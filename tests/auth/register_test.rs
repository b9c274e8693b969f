use axum::http::StatusCode;
use serde_json::json;

use crate::common::{register_verified_user, test_email, test_password, TestContext};

fn wrong_otp(real: &str) -> String {
    if real == "000000" {
        "000001".to_string()
    } else {
        "000000".to_string()
    }
}

#[tokio::test]
async fn register_and_verify_creates_a_usable_account() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({ "email": &email, "password": test_password() }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["is_account_verified"], true);
}

#[tokio::test]
async fn register_rejects_already_verified_email() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Someone Else",
            "email": &email,
            "password": test_password(),
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn register_rejects_invalid_payload() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "",
            "email": "not-an-email",
            "password": "short",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_fails_before_otp_verification() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "name": "Pending User",
            "email": &email,
            "password": test_password(),
        }))
        .await;

    // No user row exists until the OTP verifies.
    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({ "email": &email, "password": test_password() }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_otp_spends_an_attempt_but_correct_one_still_verifies() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "name": "Retry User",
            "email": &email,
            "password": test_password(),
        }))
        .await;
    let otp = ctx.wait_for_otp(&email).await;

    let response = ctx
        .server
        .post("/auth/verify-otp")
        .json(&json!({ "email": &email, "otp": wrong_otp(&otp) }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = ctx
        .server
        .post("/auth/verify-otp")
        .json(&json!({ "email": &email, "otp": otp }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn fifth_wrong_otp_hits_the_cap_and_kills_the_registration() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({
            "name": "Locked Out",
            "email": &email,
            "password": test_password(),
        }))
        .await;
    let otp = ctx.wait_for_otp(&email).await;
    let bad = wrong_otp(&otp);

    for _ in 0..4 {
        let response = ctx
            .server
            .post("/auth/verify-otp")
            .json(&json!({ "email": &email, "otp": &bad }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    // Fifth wrong attempt reports the cap.
    let response = ctx
        .server
        .post("/auth/verify-otp")
        .json(&json!({ "email": &email, "otp": &bad }))
        .await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);

    // The pending registration is purged with it; even the real code is
    // useless now.
    let response = ctx
        .server
        .post("/auth/verify-otp")
        .json(&json!({ "email": &email, "otp": otp }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["msg"], "Registration expired");
}

#[tokio::test]
async fn verify_sends_welcome_mail() {
    let ctx = TestContext::new().await;
    let email = register_verified_user(&ctx).await;

    let job = ctx.wait_for_mail("WELCOME", &email).await;
    assert_eq!(job.recipient(), email);
}
