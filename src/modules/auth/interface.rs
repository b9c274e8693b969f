use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::model::{BackupCode, NewSession, Session, User};
use crate::services::cache::CacheError;

pub type Result<T> = std::result::Result<T, AuthError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_verified(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn set_last_login(&self, user_id: &str) -> Result<()>;
    async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()>;
    async fn enable_two_factor(
        &self,
        user_id: &str,
        secret_cipher: &str,
        secret_nonce: &str,
    ) -> Result<()>;
    /// Clears the 2FA columns and deletes the user's backup codes in one
    /// durable transaction, so no request can observe a half-disabled state.
    async fn disable_two_factor(&self, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &NewSession) -> Result<()>;
    /// Active-session lookup used to authorize refresh/revoke. A session
    /// with a non-null `revoked_at` is treated as inactive even if
    /// `is_active` were stale.
    async fn find_active(&self, session_id: &str, user_id: &str) -> Result<Option<Session>>;
    async fn rotate_refresh_token(
        &self,
        session_id: &str,
        user_id: &str,
        new_hash: &str,
    ) -> Result<()>;
    async fn revoke(&self, session_id: &str, user_id: &str) -> Result<()>;
    async fn revoke_all_except(&self, user_id: &str, keep_session_id: &str) -> Result<u64>;
    async fn revoke_all(&self, user_id: &str) -> Result<u64>;
    async fn count_active(&self, user_id: &str) -> Result<i64>;
    /// All sessions for the user, newest first, excluding the given one.
    async fn list_for_user(&self, user_id: &str, exclude_session_id: &str)
        -> Result<Vec<Session>>;
}

#[async_trait]
pub trait BackupCodeRepository: Send + Sync {
    async fn insert_batch(&self, user_id: &str, hashes: &[String]) -> Result<()>;
    async fn find_unused(&self, user_id: &str) -> Result<Vec<BackupCode>>;
    /// Conditional used=false -> used=true flip. Returns false when another
    /// redemption won the race.
    async fn consume(&self, code_id: &str) -> Result<bool>;
    async fn delete_for_user(&self, user_id: &str) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Please enter valid details")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid temp token")]
    InvalidTempToken,

    #[error("User with this email already registered")]
    EmailAlreadyRegistered,

    #[error("Registration expired")]
    RegistrationExpired,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    OtpInvalid,

    #[error("Too many invalid attempts")]
    TooManyAttempts,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Refresh token compromised")]
    RefreshTokenCompromised,

    #[error("2FA already enabled")]
    TwoFactorAlreadyEnabled,

    #[error("2FA is not enabled")]
    TwoFactorNotEnabled,

    #[error("2FA is misconfigured on this account")]
    TwoFactorMisconfigured,

    #[error("2FA session expired")]
    TwoFactorSetupExpired,

    #[error("Wrong 2FA code")]
    WrongTwoFactorCode,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::EmailAlreadyRegistered
            | Self::RegistrationExpired
            | Self::OtpExpired
            | Self::OtpInvalid
            | Self::TwoFactorAlreadyEnabled
            | Self::TwoFactorNotEnabled
            | Self::TwoFactorMisconfigured
            | Self::TwoFactorSetupExpired
            | Self::WrongTwoFactorCode
            | Self::UserNotFound => StatusCode::BAD_REQUEST,

            Self::InvalidCredentials
            | Self::MissingToken
            | Self::InvalidToken
            | Self::SessionNotFound
            | Self::RefreshTokenCompromised => StatusCode::UNAUTHORIZED,

            Self::InvalidTempToken => StatusCode::FORBIDDEN,

            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,

            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Internal failures collapse to a generic line;
    /// detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => {
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Cache(_) | Self::Internal(_)) {
            tracing::error!("request failed: {self}");
        }
        let body = Json(super::schema::Envelope::err(self.public_message()));
        (self.status_code(), body).into_response()
    }
}
