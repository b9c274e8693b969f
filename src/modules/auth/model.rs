use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Identity record. Created only by verified registration; soft-deleted,
/// never removed.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_2fa: bool,
    /// Hex AES-GCM ciphertext of the TOTP secret. Set together with
    /// `two_factor_nonce` or not at all; both null whenever `is_2fa` is off.
    pub two_factor_secret: Option<String>,
    pub two_factor_nonce: Option<String>,
    pub is_account_verified: bool,
    pub is_account_deleted: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per successful login on one device. Kept after revocation for
/// the session-history view.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    /// Argon2 hash of the currently valid refresh token; replaced on every
    /// rotation.
    pub refresh_token_hash: String,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub ip_address: Option<String>,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when `is_active` flips false.
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: String,
    pub user_id: String,
    pub refresh_token_hash: String,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BackupCode {
    pub id: String,
    pub user_id: String,
    pub hash_code: String,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Cache-only registration awaiting its OTP, keyed by email. TTL 600s.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PendingRegistration {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Cache-only 2FA enrollment state: the plaintext secret is held only for
/// the confirmation window, then committed encrypted or dropped.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TempTwoFactorSetup {
    pub secret: String,
    pub attempts: u32,
}
