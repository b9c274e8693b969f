use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use super::extract::{AuthUser, TempUser};
use super::interface::{AuthError, Result};
use super::schema::{
    BackupCodesResponse, ChangePasswordRequest, Envelope, ForgotPasswordRequest, LoginRequest,
    LoginResponse, PasswordConfirmRequest, RefreshResponse, RegisterRequest, ResetPasswordRequest,
    TwoFactorPendingResponse, TwoFactorSetupResponse, UserResponse, VerifyRegisterOtpRequest,
    VerifyResetOtpRequest, VerifyTwoFactorLoginRequest, VerifyTwoFactorSetupRequest,
};
use super::service::{IssuedSession, LoginFlow};
use crate::services::cookies::{ACCESS_COOKIE, REFRESH_COOKIE, SESSION_COOKIE, TEMP_COOKIE};
use crate::AppState;

fn validated<T: Validate>(payload: &T) -> Result<()> {
    payload
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))
}

fn session_cookies(state: &AppState, jar: CookieJar, issued: &IssuedSession) -> CookieJar {
    jar.add(state.cookies.access(issued.access_token.clone()))
        .add(state.cookies.refresh(issued.refresh_token.clone()))
        .add(state.cookies.session(issued.session_id.clone()))
        .remove(state.cookies.removal(TEMP_COOKIE))
}

fn clear_session_cookies(state: &AppState, jar: CookieJar) -> CookieJar {
    jar.remove(state.cookies.removal(ACCESS_COOKIE))
        .remove(state.cookies.removal(REFRESH_COOKIE))
        .remove(state.cookies.removal(SESSION_COOKIE))
        .remove(state.cookies.removal(TEMP_COOKIE))
}

// =============================================================================
// POST /auth/register
// =============================================================================

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope>)> {
    validated(&payload)?;
    state
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await?;
    Ok((
        StatusCode::OK,
        Json(Envelope::ok("Verification OTP sent to your email")),
    ))
}

// =============================================================================
// POST /auth/verify-otp
// =============================================================================

pub async fn verify_register_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRegisterOtpRequest>,
) -> Result<(StatusCode, Json<Envelope>)> {
    validated(&payload)?;
    state
        .auth
        .verify_register_otp(&payload.email, &payload.otp)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Account verified successfully")),
    ))
}

// =============================================================================
// POST /auth/login
// =============================================================================

pub enum LoginReply {
    Session(Json<LoginResponse>),
    Pending(Json<TwoFactorPendingResponse>),
}

impl axum::response::IntoResponse for LoginReply {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Session(body) => body.into_response(),
            Self::Pending(body) => body.into_response(),
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, LoginReply)> {
    validated(&payload)?;
    let device = crate::services::device::DeviceInfo::from_headers(&headers);

    match state
        .auth
        .login(&payload.email, &payload.password, &device)
        .await?
    {
        LoginFlow::Session(issued) => {
            let jar = session_cookies(&state, jar, &issued);
            let body = LoginResponse {
                success: true,
                msg: "Logged in successfully".to_string(),
                user: UserResponse::from(&issued.user),
            };
            Ok((jar, LoginReply::Session(Json(body))))
        }
        LoginFlow::TwoFactorPending { temp_token } => {
            let jar = jar.add(state.cookies.temp(temp_token));
            let body = TwoFactorPendingResponse {
                success: true,
                msg: "Two-factor code required".to_string(),
                two_factor_enabled: true,
            };
            Ok((jar, LoginReply::Pending(Json(body))))
        }
    }
}

// =============================================================================
// POST /auth/2fa/verify-login
// =============================================================================

pub async fn verify_two_factor_login(
    State(state): State<AppState>,
    user: TempUser,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
    Json(payload): Json<VerifyTwoFactorLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    validated(&payload)?;
    let device = crate::services::device::DeviceInfo::from_headers(&headers);

    let issued = state
        .auth
        .verify_two_factor_login(&user.user_id, &payload.code, payload.kind, &device)
        .await?;

    let body = LoginResponse {
        success: true,
        msg: "Logged in successfully".to_string(),
        user: UserResponse::from(&issued.user),
    };
    let jar = session_cookies(&state, jar, &issued);
    Ok((jar, Json(body)))
}

// =============================================================================
// POST /auth/refresh
// =============================================================================

pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let (Some(refresh_token), Some(session_id)) = (refresh_token, session_id) else {
        let jar = clear_session_cookies(&state, jar);
        return (jar, AuthError::MissingToken).into_response();
    };

    match state.auth.refresh(&refresh_token, &session_id).await {
        Ok(rotated) => {
            let body = RefreshResponse {
                success: true,
                msg: "Token refreshed".to_string(),
                access_token: rotated.access_token.clone(),
            };
            let jar = jar
                .add(state.cookies.access(rotated.access_token))
                .add(state.cookies.refresh(rotated.refresh_token));
            (jar, Json(body)).into_response()
        }
        Err(e) => {
            // Whatever the failure, the cookies the client holds are no
            // longer good for anything.
            let jar = clear_session_cookies(&state, jar);
            (jar, e).into_response()
        }
    }
}

// =============================================================================
// POST /auth/logout
// =============================================================================

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<Envelope>) {
    let refresh_token = jar.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    state
        .auth
        .logout(refresh_token.as_deref(), session_id.as_deref())
        .await;

    let jar = clear_session_cookies(&state, jar);
    (jar, Json(Envelope::ok("Logged out successfully")))
}

// =============================================================================
// POST /auth/forgot-password
// =============================================================================

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Envelope>> {
    validated(&payload)?;
    state.auth.forgot_password(&payload.email).await?;
    Ok(Json(Envelope::ok(
        "If that email exists, a reset OTP has been sent",
    )))
}

// =============================================================================
// POST /auth/verify-reset-otp
// =============================================================================

pub async fn verify_reset_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyResetOtpRequest>,
) -> Result<Json<Envelope>> {
    validated(&payload)?;
    state
        .auth
        .verify_reset_otp(&payload.email, &payload.otp)
        .await?;
    Ok(Json(Envelope::ok("OTP verified")))
}

// =============================================================================
// POST /auth/reset-password
// =============================================================================

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Envelope>> {
    validated(&payload)?;
    state
        .auth
        .reset_password(&payload.email, &payload.otp, &payload.new_password)
        .await?;
    Ok(Json(Envelope::ok("Password reset successfully")))
}

// =============================================================================
// POST /auth/2fa/setup
// =============================================================================

pub async fn setup_two_factor(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TwoFactorSetupResponse>> {
    let (secret, uri) = state.auth.setup_two_factor(&user.user_id).await?;
    Ok(Json(TwoFactorSetupResponse {
        success: true,
        msg: "Scan the QR code and confirm with a code".to_string(),
        otpauth_uri: uri,
        secret,
    }))
}

// =============================================================================
// POST /auth/2fa/verify
// =============================================================================

pub async fn verify_two_factor_setup(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyTwoFactorSetupRequest>,
) -> Result<Json<BackupCodesResponse>> {
    validated(&payload)?;
    let codes = state
        .auth
        .verify_two_factor_setup(&user.user_id, &payload.otp)
        .await?;
    Ok(Json(BackupCodesResponse {
        success: true,
        msg: "Two-factor authentication enabled. Store these codes safely".to_string(),
        backup_codes: codes,
    }))
}

// =============================================================================
// POST /auth/2fa/disable
// =============================================================================

pub async fn disable_two_factor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PasswordConfirmRequest>,
) -> Result<Json<Envelope>> {
    validated(&payload)?;
    state
        .auth
        .disable_two_factor(&user.user_id, &payload.password)
        .await?;
    Ok(Json(Envelope::ok("Two-factor authentication disabled")))
}

// =============================================================================
// POST /auth/2fa/backup-codes
// =============================================================================

pub async fn regenerate_backup_codes(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PasswordConfirmRequest>,
) -> Result<Json<BackupCodesResponse>> {
    validated(&payload)?;
    let codes = state
        .auth
        .regenerate_backup_codes(&user.user_id, &payload.password)
        .await?;
    Ok(Json(BackupCodesResponse {
        success: true,
        msg: "New backup codes generated. Previous codes no longer work".to_string(),
        backup_codes: codes,
    }))
}

// =============================================================================
// PUT /auth/change-password
// =============================================================================

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Envelope>> {
    validated(&payload)?;
    state
        .auth
        .change_password(&user.user_id, &payload.password, &payload.new_password)
        .await?;
    Ok(Json(Envelope::ok("Password changed successfully")))
}
