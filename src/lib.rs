pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use modules::auth::auth_routes;
use modules::auth::service::AuthService;
use modules::user::user_routes;
use services::cookies::CookiePolicy;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub cookies: CookiePolicy,
}

pub async fn create_app(auth: AuthService, cookies: CookiePolicy) -> Router {
    let state = AppState { auth, cookies };

    // Rate limit: burst of 20, then 60 per minute across the instance
    let rate_limiter = create_rate_limiter(60, 20);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/user", user_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Secure Auth API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
