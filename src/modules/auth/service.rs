use std::sync::Arc;

use uuid::Uuid;

use super::interface::{
    AuthError, BackupCodeRepository, Result, SessionRepository, UserRepository,
};
use super::model::{NewSession, PendingRegistration, Session, TempTwoFactorSetup, User};
use super::schema::TwoFactorCodeKind;
use crate::services::backup_codes::BackupCodeManager;
use crate::services::cache::CacheStore;
use crate::services::device::DeviceInfo;
use crate::services::hashing;
use crate::services::jwt::TokenIssuer;
use crate::services::mailer::{MailJob, Mailer};
use crate::services::otp::{OtpPurpose, OtpStore, OtpVerifyOutcome, OTP_TTL_SECS};
use crate::services::secret_cipher::SecretCipher;
use crate::services::totp;

const PENDING_REGISTRATION_TTL_SECS: u64 = 600;
const TWO_FA_SETUP_TTL_SECS: u64 = 300;
const MAX_SETUP_ATTEMPTS: u32 = 5;

fn pending_key(email: &str) -> String {
    format!("pending-user:{email}")
}

fn setup_key(user_id: &str) -> String {
    format!("2fa:setup:{user_id}")
}

/// A login that produced a session: the tokens plus the session id that
/// travels out-of-band next to them.
pub struct IssuedSession {
    pub user: User,
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login either completes immediately or parks in TWO_FACTOR_PENDING,
/// represented entirely by the temp token.
pub enum LoginFlow {
    Session(IssuedSession),
    TwoFactorPending { temp_token: String },
}

pub struct RotatedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// The auth orchestrator: every credential/session/2FA flow goes through
/// here, one authoritative implementation per flow. Handlers only translate
/// HTTP to these calls and back.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    backup_codes: BackupCodeManager,
    cache: Arc<dyn CacheStore>,
    otp: OtpStore,
    tokens: TokenIssuer,
    cipher: SecretCipher,
    mailer: Mailer,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        backup_code_repo: Arc<dyn BackupCodeRepository>,
        cache: Arc<dyn CacheStore>,
        tokens: TokenIssuer,
        cipher: SecretCipher,
        mailer: Mailer,
    ) -> Self {
        Self {
            users,
            sessions,
            backup_codes: BackupCodeManager::new(backup_code_repo),
            otp: OtpStore::new(cache.clone()),
            cache,
            tokens,
            cipher,
            mailer,
        }
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Stashes the registration in the cache and sends the verification OTP.
    /// Nothing touches the users table until the OTP verifies.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            if existing.is_account_verified {
                return Err(AuthError::EmailAlreadyRegistered);
            }
        }

        let otp = self
            .otp
            .issue(email, OtpPurpose::AccountVerify, OTP_TTL_SECS)
            .await?;

        let password_hash =
            hashing::hash_password(password).map_err(|e| AuthError::Internal(e.to_string()))?;
        let pending = PendingRegistration {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        };
        let payload =
            serde_json::to_string(&pending).map_err(|e| AuthError::Internal(e.to_string()))?;
        self.cache
            .set_ex(&pending_key(email), &payload, PENDING_REGISTRATION_TTL_SECS)
            .await?;

        self.mailer.enqueue(MailJob::AccountVerify {
            name: name.to_string(),
            email: email.to_string(),
            otp,
        });
        Ok(())
    }

    /// The sole creation point for durable user rows.
    pub async fn verify_register_otp(&self, email: &str, otp: &str) -> Result<User> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            if existing.is_account_verified {
                return Err(AuthError::EmailAlreadyRegistered);
            }
        }

        let key = pending_key(email);
        let raw = self
            .cache
            .get(&key)
            .await?
            .ok_or(AuthError::RegistrationExpired)?;
        let pending: PendingRegistration =
            serde_json::from_str(&raw).map_err(|e| AuthError::Internal(e.to_string()))?;

        match self.otp.verify(email, OtpPurpose::AccountVerify, otp).await? {
            OtpVerifyOutcome::Valid => {}
            OtpVerifyOutcome::Expired => return Err(AuthError::OtpExpired),
            OtpVerifyOutcome::Invalid => return Err(AuthError::OtpInvalid),
            OtpVerifyOutcome::TooManyAttempts => {
                // The cap kills the whole flow, not just the code: the
                // pending registration goes with it.
                self.cache.del(&key).await?;
                return Err(AuthError::TooManyAttempts);
            }
        }

        self.cache.del(&key).await?;

        let user = self
            .users
            .create_verified(&pending.name, &pending.email, &pending.password_hash)
            .await?;

        self.mailer.enqueue(MailJob::Welcome {
            name: user.name.clone(),
            email: user.email.clone(),
        });
        Ok(user)
    }

    // =========================================================================
    // Login / 2FA challenge
    // =========================================================================

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: &DeviceInfo,
    ) -> Result<LoginFlow> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Same cost as a real verification; unknown emails must not
                // answer faster than wrong passwords.
                hashing::verify_dummy(password);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        if user.is_2fa {
            let temp_token = self
                .tokens
                .create_temp_token(&user.id, &user.email, user.is_2fa)
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            return Ok(LoginFlow::TwoFactorPending { temp_token });
        }

        let issued = self.create_session(user, device).await?;
        Ok(LoginFlow::Session(issued))
    }

    /// Completes a TWO_FACTOR_PENDING login with either a TOTP code or a
    /// backup code. This and the non-2FA login branch are the only two
    /// session-creation points.
    pub async fn verify_two_factor_login(
        &self,
        user_id: &str,
        code: &str,
        kind: TwoFactorCodeKind,
        device: &DeviceInfo,
    ) -> Result<IssuedSession> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        match kind {
            TwoFactorCodeKind::Otp => {
                let (cipher_hex, nonce_hex) = match (&user.two_factor_secret, &user.two_factor_nonce)
                {
                    (Some(c), Some(n)) => (c.clone(), n.clone()),
                    _ => return Err(AuthError::TwoFactorMisconfigured),
                };
                let secret = self
                    .cipher
                    .decrypt(&cipher_hex, &nonce_hex)
                    .map_err(|_| AuthError::TwoFactorMisconfigured)?;
                let valid = totp::verify(code, &secret)
                    .map_err(|_| AuthError::TwoFactorMisconfigured)?;
                if !valid {
                    return Err(AuthError::WrongTwoFactorCode);
                }
            }
            TwoFactorCodeKind::Backup => {
                if !self.backup_codes.redeem(&user.id, code).await? {
                    return Err(AuthError::WrongTwoFactorCode);
                }
            }
        }

        self.create_session(user, device).await
    }

    async fn create_session(&self, user: User, device: &DeviceInfo) -> Result<IssuedSession> {
        let session_id = Uuid::new_v4().to_string();

        let access_token = self
            .tokens
            .create_access_token(&user.id, &user.email, user.is_2fa, &session_id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = self
            .tokens
            .create_refresh_token(&user.id, &user.email, user.is_2fa)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let refresh_token_hash = hashing::hash_password(&refresh_token)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.sessions
            .create(&NewSession {
                id: session_id.clone(),
                user_id: user.id.clone(),
                refresh_token_hash,
                device_name: device.device_name.clone(),
                device_type: device.device_type.clone(),
                os: device.os.clone(),
                browser: device.browser.clone(),
                ip_address: device.ip_address.clone(),
            })
            .await?;

        self.users.set_last_login(&user.id).await?;

        Ok(IssuedSession {
            user,
            session_id,
            access_token,
            refresh_token,
        })
    }

    // =========================================================================
    // Token rotation / logout / revocation
    // =========================================================================

    /// Rotates the refresh token, burning the session when a stale token
    /// with a valid signature shows up: that only happens when a captured
    /// token is replayed after the legitimate client rotated past it, or an
    /// attacker is racing the client. Either way the session is not trusted.
    pub async fn refresh(&self, refresh_token: &str, session_id: &str) -> Result<RotatedTokens> {
        let claims = self
            .tokens
            .verify_refresh_token(refresh_token)
            .ok_or(AuthError::InvalidToken)?;

        let session = self
            .sessions
            .find_active(session_id, &claims.sub)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let matches = hashing::verify_password(refresh_token, &session.refresh_token_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !matches {
            self.sessions.revoke(session_id, &claims.sub).await?;
            tracing::warn!(session_id, "stale refresh token replayed, session revoked");
            return Err(AuthError::RefreshTokenCompromised);
        }

        let access_token = self
            .tokens
            .create_access_token(&claims.sub, &claims.email, claims.is2fa, session_id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let new_refresh_token = self
            .tokens
            .create_refresh_token(&claims.sub, &claims.email, claims.is2fa)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let new_hash = hashing::hash_password(&new_refresh_token)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.sessions
            .rotate_refresh_token(session_id, &claims.sub, &new_hash)
            .await?;

        Ok(RotatedTokens {
            access_token,
            refresh_token: new_refresh_token,
        })
    }

    /// Best-effort: revokes the session when the presented cookies check
    /// out, succeeds regardless. Logout must never fail client-side.
    pub async fn logout(&self, refresh_token: Option<&str>, session_id: Option<&str>) {
        let (Some(refresh_token), Some(session_id)) = (refresh_token, session_id) else {
            return;
        };
        let Some(claims) = self.tokens.verify_refresh_token(refresh_token) else {
            return;
        };

        match self.sessions.find_active(session_id, &claims.sub).await {
            Ok(Some(session)) => {
                let matches =
                    hashing::verify_password(refresh_token, &session.refresh_token_hash)
                        .unwrap_or(false);
                if matches {
                    if let Err(e) = self.sessions.revoke(session_id, &claims.sub).await {
                        tracing::warn!("logout revocation failed: {e}");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("logout session lookup failed: {e}"),
        }
    }

    /// Revokes every other active session for the user in one update. The
    /// caller must prove possession of the current session's refresh token.
    pub async fn terminate_other_sessions(
        &self,
        user_id: &str,
        session_id: &str,
        refresh_token: &str,
    ) -> Result<u64> {
        let session = self
            .sessions
            .find_active(session_id, user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let matches = hashing::verify_password(refresh_token, &session.refresh_token_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !matches {
            return Err(AuthError::SessionNotFound);
        }

        self.sessions.revoke_all_except(user_id, session_id).await
    }

    /// Revoke-by-id, always scoped to the caller's own user id.
    pub async fn revoke_session(&self, user_id: &str, session_id: &str) -> Result<()> {
        self.sessions.revoke(session_id, user_id).await
    }

    // =========================================================================
    // 2FA lifecycle
    // =========================================================================

    /// Starts enrollment: the plaintext secret lives only in the cache until
    /// the user proves they captured it.
    pub async fn setup_two_factor(&self, user_id: &str) -> Result<(String, String)> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.is_2fa {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let secret = totp::generate_secret();
        let uri = totp::key_uri(&user.email, &secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let record = TempTwoFactorSetup {
            secret: secret.clone(),
            attempts: 0,
        };
        let payload =
            serde_json::to_string(&record).map_err(|e| AuthError::Internal(e.to_string()))?;
        self.cache
            .set_ex(&setup_key(user_id), &payload, TWO_FA_SETUP_TTL_SECS)
            .await?;

        Ok((secret, uri))
    }

    /// Confirms enrollment: commits the secret encrypted, flips `is_2fa`,
    /// and hands back the one-time backup code batch.
    pub async fn verify_two_factor_setup(
        &self,
        user_id: &str,
        otp: &str,
    ) -> Result<Vec<String>> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.is_2fa {
            return Err(AuthError::TwoFactorAlreadyEnabled);
        }

        let key = setup_key(user_id);
        let raw = self
            .cache
            .get(&key)
            .await?
            .ok_or(AuthError::TwoFactorSetupExpired)?;
        let mut record: TempTwoFactorSetup =
            serde_json::from_str(&raw).map_err(|e| AuthError::Internal(e.to_string()))?;

        let valid = totp::verify(otp, &record.secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            record.attempts += 1;
            if record.attempts >= MAX_SETUP_ATTEMPTS {
                self.cache.del(&key).await?;
                return Err(AuthError::TooManyAttempts);
            }
            let payload =
                serde_json::to_string(&record).map_err(|e| AuthError::Internal(e.to_string()))?;
            self.cache.set_keep_ttl(&key, &payload).await?;
            return Err(AuthError::OtpInvalid);
        }

        let sealed = self
            .cipher
            .encrypt(&record.secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.users
            .enable_two_factor(user_id, &sealed.cipher, &sealed.nonce)
            .await?;
        self.cache.del(&key).await?;

        let codes = self.backup_codes.generate_batch(user_id).await?;

        self.mailer.enqueue(MailJob::TwoFaEnableAlert {
            name: user.name.clone(),
            email: user.email.clone(),
        });
        Ok(codes)
    }

    /// Password re-verification guards against a hijacked session being used
    /// to strip the second factor.
    pub async fn disable_two_factor(&self, user_id: &str, password: &str) -> Result<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_2fa {
            return Err(AuthError::TwoFactorNotEnabled);
        }

        let valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.users.disable_two_factor(user_id).await?;

        self.mailer.enqueue(MailJob::TwoFaDisableAlert {
            name: user.name,
            email: user.email,
        });
        Ok(())
    }

    pub async fn regenerate_backup_codes(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<Vec<String>> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_2fa {
            return Err(AuthError::TwoFactorNotEnabled);
        }

        let valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.backup_codes.regenerate(user_id).await
    }

    // =========================================================================
    // Password reset / change
    // =========================================================================

    /// Issues a reset OTP. Replies identically whether or not the email
    /// exists, so the endpoint is not an account oracle.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(());
        };

        let otp = self
            .otp
            .issue(email, OtpPurpose::ResetPassword, OTP_TTL_SECS)
            .await?;

        self.mailer.enqueue(MailJob::PasswordReset {
            name: user.name,
            email: email.to_string(),
            otp,
        });
        Ok(())
    }

    /// Preflight for the reset form; leaves the OTP in place for the actual
    /// reset call.
    pub async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<()> {
        match self.otp.check(email, OtpPurpose::ResetPassword, otp).await? {
            OtpVerifyOutcome::Valid => Ok(()),
            OtpVerifyOutcome::Expired => Err(AuthError::OtpExpired),
            OtpVerifyOutcome::Invalid => Err(AuthError::OtpInvalid),
            OtpVerifyOutcome::TooManyAttempts => Err(AuthError::TooManyAttempts),
        }
    }

    /// Consumes the OTP, stores the new hash and burns every active session:
    /// a reset implies the old credential cannot be trusted, so neither can
    /// the sessions built on it.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        match self.otp.verify(email, OtpPurpose::ResetPassword, otp).await? {
            OtpVerifyOutcome::Valid => {}
            OtpVerifyOutcome::Expired => return Err(AuthError::OtpExpired),
            OtpVerifyOutcome::Invalid => return Err(AuthError::OtpInvalid),
            OtpVerifyOutcome::TooManyAttempts => return Err(AuthError::TooManyAttempts),
        }

        let hash = hashing::hash_password(new_password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.users.update_password(&user.id, &hash).await?;
        self.sessions.revoke_all(&user.id).await?;

        self.mailer.enqueue(MailJob::PasswordResetAlert {
            name: user.name,
            email: email.to_string(),
        });
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let hash = hashing::hash_password(new_password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.users.update_password(user_id, &hash).await
    }

    // =========================================================================
    // Profile / sessions views
    // =========================================================================

    pub async fn current_user(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(User, Session, i64)> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let session = self
            .sessions
            .find_active(session_id, user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        let active = self.sessions.count_active(user_id).await?;
        Ok((user, session, active))
    }

    pub async fn list_sessions(&self, user_id: &str, session_id: &str) -> Result<Vec<Session>> {
        self.sessions.list_for_user(user_id, session_id).await
    }
}
