use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::{Session, User};

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRegisterOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

// =============================================================================
// LOGIN / 2FA
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Which second factor the client is presenting.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TwoFactorCodeKind {
    Otp,
    Backup,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyTwoFactorLoginRequest {
    #[validate(length(min = 6, message = "Code is required"))]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: TwoFactorCodeKind,
}

// =============================================================================
// PASSWORD RESET / CHANGE
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyResetOtpRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

// =============================================================================
// 2FA MANAGEMENT
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyTwoFactorSetupRequest {
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordConfirmRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

// =============================================================================
// SESSIONS
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RevokeSessionRequest {
    #[validate(length(min = 1, message = "Session id is required"))]
    pub sid: String,
}

// =============================================================================
// RESPONSES — uniform {success, msg, ...} envelope
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub msg: String,
}

impl Envelope {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            success: true,
            msg: msg.into(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_account_verified: bool,
    pub is_2fa: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_account_verified: user.is_account_verified,
            is_2fa: user.is_2fa,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub msg: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct TwoFactorPendingResponse {
    pub success: bool,
    pub msg: String,
    pub two_factor_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub msg: String,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct TwoFactorSetupResponse {
    pub success: bool,
    pub msg: String,
    pub otpauth_uri: String,
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct BackupCodesResponse {
    pub success: bool,
    pub msg: String,
    pub backup_codes: Vec<String>,
}

/// Session row as surfaced to the device-management view. The refresh-token
/// hash never leaves the store.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub ip_address: Option<String>,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            device_name: session.device_name.clone(),
            device_type: session.device_type.clone(),
            os: session.os.clone(),
            browser: session.browser.clone(),
            ip_address: session.ip_address.clone(),
            is_active: session.is_active,
            last_used_at: session.last_used_at,
            created_at: session.created_at,
            revoked_at: session.revoked_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub success: bool,
    pub data: Vec<SessionResponse>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
    pub session: SessionResponse,
    pub active_sessions: i64,
}
