use axum::routing::{get, post};
use axum::Router;

use super::controller;
use crate::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(controller::me))
        .route("/sessions", get(controller::list_sessions))
        .route(
            "/sessions/terminate-others",
            post(controller::terminate_other_sessions),
        )
        .route("/sessions/revoke", post(controller::revoke_session))
}
