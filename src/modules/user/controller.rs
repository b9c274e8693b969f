use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::modules::auth::extract::AuthUser;
use crate::modules::auth::interface::{AuthError, Result};
use crate::modules::auth::schema::{
    Envelope, MeResponse, RevokeSessionRequest, SessionListResponse, SessionResponse, UserResponse,
};
use crate::services::cookies::REFRESH_COOKIE;
use crate::AppState;

// =============================================================================
// GET /user/me
// =============================================================================

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<MeResponse>> {
    let (account, session, active_sessions) = state
        .auth
        .current_user(&user.user_id, &user.session_id)
        .await?;
    Ok(Json(MeResponse {
        success: true,
        user: UserResponse::from(&account),
        session: SessionResponse::from(&session),
        active_sessions,
    }))
}

// =============================================================================
// GET /user/sessions
// =============================================================================

pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SessionListResponse>> {
    let sessions = state
        .auth
        .list_sessions(&user.user_id, &user.session_id)
        .await?;
    Ok(Json(SessionListResponse {
        success: true,
        data: sessions.iter().map(SessionResponse::from).collect(),
    }))
}

// =============================================================================
// POST /user/sessions/terminate-others
// =============================================================================

pub async fn terminate_other_sessions(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<Json<Envelope>> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AuthError::MissingToken)?;

    let revoked = state
        .auth
        .terminate_other_sessions(&user.user_id, &user.session_id, &refresh_token)
        .await?;
    Ok(Json(Envelope::ok(format!(
        "Terminated {revoked} other session(s)"
    ))))
}

// =============================================================================
// POST /user/sessions/revoke
// =============================================================================

pub async fn revoke_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RevokeSessionRequest>,
) -> Result<Json<Envelope>> {
    payload
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;
    state
        .auth
        .revoke_session(&user.user_id, &payload.sid)
        .await?;
    Ok(Json(Envelope::ok("Session revoked")))
}
