use axum::routing::{post, put};
use axum::Router;

use super::controller;
use crate::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/verify-otp", post(controller::verify_register_otp))
        .route("/login", post(controller::login))
        .route("/refresh", post(controller::refresh))
        .route("/logout", post(controller::logout))
        .route("/forgot-password", post(controller::forgot_password))
        .route("/verify-reset-otp", post(controller::verify_reset_otp))
        .route("/reset-password", post(controller::reset_password))
        .route("/change-password", put(controller::change_password))
        .route("/2fa/setup", post(controller::setup_two_factor))
        .route("/2fa/verify", post(controller::verify_two_factor_setup))
        .route("/2fa/verify-login", post(controller::verify_two_factor_login))
        .route("/2fa/disable", post(controller::disable_two_factor))
        .route(
            "/2fa/backup-codes",
            post(controller::regenerate_backup_codes),
        )
}
