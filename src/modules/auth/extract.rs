use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use super::interface::AuthError;
use crate::services::cookies::{ACCESS_COOKIE, TEMP_COOKIE};
use crate::AppState;

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_token(parts: &Parts, name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(name)
        .map(|c| c.value().to_string())
}

/// Caller authenticated by a live access token, cookie or bearer header.
/// Carries the session id baked into the token so handlers can scope
/// session operations without another lookup.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub is_2fa: bool,
    pub session_id: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_token(parts, ACCESS_COOKIE)
            .or_else(|| bearer_token(parts))
            .ok_or(AuthError::MissingToken)?;

        let claims = state
            .auth
            .token_issuer()
            .verify_access_token(&token)
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            is_2fa: claims.is2fa,
            session_id: claims.sid,
        })
    }
}

/// Caller holding only a mid-login temp token. Grants access to exactly
/// one operation: completing the 2FA challenge.
#[derive(Debug, Clone)]
pub struct TempUser {
    pub user_id: String,
    pub email: String,
}

impl FromRequestParts<AppState> for TempUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_token(parts, TEMP_COOKIE)
            .or_else(|| bearer_token(parts))
            .ok_or(AuthError::MissingToken)?;

        let claims = state
            .auth
            .token_issuer()
            .verify_temp_token(&token)
            .ok_or(AuthError::InvalidTempToken)?;

        Ok(TempUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
