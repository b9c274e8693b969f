use std::sync::Arc;

use rand::RngCore;

use crate::modules::auth::interface::{AuthError, BackupCodeRepository};
use crate::services::hashing;

pub const BACKUP_CODE_BATCH: usize = 6;

/// Single-use recovery codes substituting for a TOTP code. Codes are
/// Argon2id-hashed at rest; the plaintext batch is surfaced to the user
/// exactly once.
#[derive(Clone)]
pub struct BackupCodeManager {
    repo: Arc<dyn BackupCodeRepository>,
}

impl BackupCodeManager {
    pub fn new(repo: Arc<dyn BackupCodeRepository>) -> Self {
        Self { repo }
    }

    /// Generates, hashes and persists a fresh batch, returning the
    /// plaintexts for one-time display.
    pub async fn generate_batch(&self, user_id: &str) -> Result<Vec<String>, AuthError> {
        let mut plaintexts = Vec::with_capacity(BACKUP_CODE_BATCH);
        let mut hashes = Vec::with_capacity(BACKUP_CODE_BATCH);

        for _ in 0..BACKUP_CODE_BATCH {
            let code = generate_code();
            let hash = hashing::hash_password(&code)
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            plaintexts.push(code);
            hashes.push(hash);
        }

        self.repo.insert_batch(user_id, &hashes).await?;
        Ok(plaintexts)
    }

    /// Replaces the user's whole set with a new batch.
    pub async fn regenerate(&self, user_id: &str) -> Result<Vec<String>, AuthError> {
        self.repo.delete_for_user(user_id).await?;
        self.generate_batch(user_id).await
    }

    /// Scans the user's unused codes for a match and consumes it with a
    /// conditional update. When two redemptions race on the same code the
    /// loser's update touches zero rows and reads as "no match".
    pub async fn redeem(&self, user_id: &str, candidate: &str) -> Result<bool, AuthError> {
        let codes = self.repo.find_unused(user_id).await?;

        for code in codes {
            let matches = hashing::verify_password(candidate, &code.hash_code)
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            if matches && self.repo.consume(&code.id).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// 5 random bytes rendered as uppercase hex: 10 characters.
fn generate_code() -> String {
    let mut bytes = [0u8; 5];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode_upper(bytes)
}
