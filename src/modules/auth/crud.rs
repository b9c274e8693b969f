use async_trait::async_trait;
use uuid::Uuid;

use super::interface::{BackupCodeRepository, Result, SessionRepository, UserRepository};
use super::model::{BackupCode, NewSession, Session, User};
use crate::config::DbPool;

#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: DbPool,
}

impl MySqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn create_verified(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_account_verified, last_login_at)
            VALUES (?, ?, ?, ?, TRUE, NOW())
            "#,
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ? AND is_account_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = ? AND is_account_deleted = FALSE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_last_login(&self, user_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_password(&self, user_id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn enable_two_factor(
        &self,
        user_id: &str,
        secret_cipher: &str,
        secret_nonce: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_2fa = TRUE, two_factor_secret = ?, two_factor_nonce = ?
            WHERE id = ?
            "#,
        )
        .bind(secret_cipher)
        .bind(secret_nonce)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn disable_two_factor(&self, user_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET is_2fa = FALSE, two_factor_secret = NULL, two_factor_nonce = NULL
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM backup_codes WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MySqlSessionRepository {
    pool: DbPool,
}

impl MySqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for MySqlSessionRepository {
    async fn create(&self, session: &NewSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_sessions
                (id, user_id, refresh_token_hash, device_name, device_type,
                 os, browser, ip_address, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, TRUE)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.refresh_token_hash)
        .bind(&session.device_name)
        .bind(&session.device_type)
        .bind(&session.os)
        .bind(&session.browser)
        .bind(&session.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active(&self, session_id: &str, user_id: &str) -> Result<Option<Session>> {
        Ok(sqlx::query_as::<_, Session>(
            r#"
            SELECT * FROM user_sessions
            WHERE id = ? AND user_id = ? AND is_active = TRUE AND revoked_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn rotate_refresh_token(
        &self,
        session_id: &str,
        user_id: &str,
        new_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_sessions
            SET refresh_token_hash = ?, last_used_at = NOW()
            WHERE id = ? AND user_id = ? AND is_active = TRUE
            "#,
        )
        .bind(new_hash)
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke(&self, session_id: &str, user_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_sessions
            SET is_active = FALSE, revoked_at = NOW()
            WHERE id = ? AND user_id = ? AND is_active = TRUE
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_all_except(&self, user_id: &str, keep_session_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET is_active = FALSE, revoked_at = NOW()
            WHERE user_id = ? AND id <> ? AND is_active = TRUE
            "#,
        )
        .bind(user_id)
        .bind(keep_session_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn revoke_all(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET is_active = FALSE, revoked_at = NOW()
            WHERE user_id = ? AND is_active = TRUE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_active(&self, user_id: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM user_sessions WHERE user_id = ? AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        exclude_session_id: &str,
    ) -> Result<Vec<Session>> {
        Ok(sqlx::query_as::<_, Session>(
            r#"
            SELECT * FROM user_sessions
            WHERE user_id = ? AND id <> ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(exclude_session_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[derive(Clone)]
pub struct MySqlBackupCodeRepository {
    pool: DbPool,
}

impl MySqlBackupCodeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BackupCodeRepository for MySqlBackupCodeRepository {
    async fn insert_batch(&self, user_id: &str, hashes: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for hash in hashes {
            sqlx::query("INSERT INTO backup_codes (id, user_id, hash_code) VALUES (?, ?, ?)")
                .bind(Uuid::new_v4().to_string())
                .bind(user_id)
                .bind(hash)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_unused(&self, user_id: &str) -> Result<Vec<BackupCode>> {
        Ok(sqlx::query_as::<_, BackupCode>(
            "SELECT * FROM backup_codes WHERE user_id = ? AND used = FALSE",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn consume(&self, code_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE backup_codes
            SET used = TRUE, used_at = NOW()
            WHERE id = ? AND used = FALSE
            "#,
        )
        .bind(code_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM backup_codes WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
