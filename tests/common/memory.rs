//! In-memory repository implementations so the full HTTP stack runs
//! without MySQL.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use secure_auth::modules::auth::interface::{
    AuthError, BackupCodeRepository, Result, SessionRepository, UserRepository,
};
use secure_auth::modules::auth::model::{BackupCode, NewSession, Session, User};

#[derive(Default)]
pub struct MemoryBackupCodes {
    rows: Mutex<Vec<BackupCode>>,
}

#[async_trait]
impl BackupCodeRepository for MemoryBackupCodes {
    async fn insert_batch(&self, user_id: &str, hashes: &[String]) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        for hash in hashes {
            rows.push(BackupCode {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                hash_code: hash.clone(),
                used: false,
                used_at: None,
                created_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn find_unused(&self, user_id: &str) -> Result<Vec<BackupCode>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|c| c.user_id == user_id && !c.used)
            .cloned()
            .collect())
    }

    async fn consume(&self, code_id: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|c| c.id == code_id && !c.used) {
            Some(code) => {
                code.used = true;
                code.used_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        self.rows.lock().unwrap().retain(|c| c.user_id != user_id);
        Ok(())
    }
}

pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
    backup_codes: Arc<MemoryBackupCodes>,
}

impl MemoryUsers {
    pub fn new(backup_codes: Arc<MemoryBackupCodes>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            backup_codes,
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn create_verified(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_2fa: false,
            two_factor_secret: None,
            two_factor_nonce: None,
            is_account_verified: true,
            is_account_deleted: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn set_last_login(&self, user_id: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(user) = rows.iter_mut().find(|u| u.id == user_id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn enable_two_factor(
        &self,
        user_id: &str,
        secret_cipher: &str,
        secret_nonce: &str,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        user.is_2fa = true;
        user.two_factor_secret = Some(secret_cipher.to_string());
        user.two_factor_nonce = Some(secret_nonce.to_string());
        Ok(())
    }

    async fn disable_two_factor(&self, user_id: &str) -> Result<()> {
        {
            let mut rows = self.rows.lock().unwrap();
            let user = rows
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or(AuthError::UserNotFound)?;
            user.is_2fa = false;
            user.two_factor_secret = None;
            user.two_factor_nonce = None;
        }
        self.backup_codes.delete_for_user(user_id).await
    }
}

#[derive(Default)]
pub struct MemorySessions {
    rows: Mutex<Vec<Session>>,
}

#[async_trait]
impl SessionRepository for MemorySessions {
    async fn create(&self, session: &NewSession) -> Result<()> {
        self.rows.lock().unwrap().push(Session {
            id: session.id.clone(),
            user_id: session.user_id.clone(),
            refresh_token_hash: session.refresh_token_hash.clone(),
            device_name: session.device_name.clone(),
            device_type: session.device_type.clone(),
            os: session.os.clone(),
            browser: session.browser.clone(),
            ip_address: session.ip_address.clone(),
            is_active: true,
            last_used_at: None,
            created_at: Utc::now(),
            revoked_at: None,
        });
        Ok(())
    }

    async fn find_active(&self, session_id: &str, user_id: &str) -> Result<Option<Session>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|s| {
                s.id == session_id && s.user_id == user_id && s.is_active && s.revoked_at.is_none()
            })
            .cloned())
    }

    async fn rotate_refresh_token(
        &self,
        session_id: &str,
        user_id: &str,
        new_hash: &str,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let session = rows
            .iter_mut()
            .find(|s| s.id == session_id && s.user_id == user_id && s.is_active)
            .ok_or(AuthError::SessionNotFound)?;
        session.refresh_token_hash = new_hash.to_string();
        session.last_used_at = Some(Utc::now());
        Ok(())
    }

    async fn revoke(&self, session_id: &str, user_id: &str) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(session) = rows
            .iter_mut()
            .find(|s| s.id == session_id && s.user_id == user_id)
        {
            session.is_active = false;
            session.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_except(&self, user_id: &str, keep_session_id: &str) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut revoked = 0;
        for session in rows
            .iter_mut()
            .filter(|s| s.user_id == user_id && s.id != keep_session_id && s.is_active)
        {
            session.is_active = false;
            session.revoked_at = Some(Utc::now());
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn revoke_all(&self, user_id: &str) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let mut revoked = 0;
        for session in rows.iter_mut().filter(|s| s.user_id == user_id && s.is_active) {
            session.is_active = false;
            session.revoked_at = Some(Utc::now());
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn count_active(&self, user_id: &str) -> Result<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .count() as i64)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        exclude_session_id: &str,
    ) -> Result<Vec<Session>> {
        let rows = self.rows.lock().unwrap();
        let mut sessions: Vec<Session> = rows
            .iter()
            .filter(|s| s.user_id == user_id && s.id != exclude_session_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }
}
