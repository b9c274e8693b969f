use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::services::cache::{CacheError, CacheStore};

pub const OTP_TTL_SECS: u64 = 300;
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// What a one-time code is allowed to prove. Part of the cache key, so a
/// code issued for one purpose never verifies for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    AccountVerify,
    ResetPassword,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountVerify => "ACCOUNT_VERIFY",
            Self::ResetPassword => "RESET_PASSWORD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerifyOutcome {
    Valid,
    /// No record: never issued, expired, or already consumed.
    Expired,
    /// Attempt cap hit; the record is purged and a fresh code must be issued.
    TooManyAttempts,
    Invalid,
}

#[derive(Serialize, Deserialize)]
struct OtpRecord {
    hashed_otp: String,
    attempts: u32,
}

/// Short-lived single-use codes in the TTL cache. The attempt counter lives
/// inside the same record as the hash, so the budget expires with the code
/// and no orphaned counters remain.
#[derive(Clone)]
pub struct OtpStore {
    cache: Arc<dyn CacheStore>,
}

impl OtpStore {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    fn key(identifier: &str, purpose: OtpPurpose) -> String {
        format!("otp:{}:{}", purpose.as_str(), identifier)
    }

    /// Issues a fresh 6-digit code, returning the plaintext for out-of-band
    /// delivery. Only a sha256 digest is stored.
    pub async fn issue(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        ttl_secs: u64,
    ) -> Result<String, CacheError> {
        let otp = generate_otp();
        let record = OtpRecord {
            hashed_otp: hash_otp(&otp),
            attempts: 0,
        };
        let payload = serde_json::to_string(&record)
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        self.cache
            .set_ex(&Self::key(identifier, purpose), &payload, ttl_secs)
            .await?;
        Ok(otp)
    }

    /// Single-use verification. Success consumes the record; the attempt cap
    /// purges it.
    pub async fn verify(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        candidate: &str,
    ) -> Result<OtpVerifyOutcome, CacheError> {
        self.verify_inner(identifier, purpose, candidate, true).await
    }

    /// Preflight check that leaves a matching record in place, so the code
    /// can still be consumed by the follow-up operation. Wrong candidates
    /// spend attempts exactly as `verify` does.
    pub async fn check(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        candidate: &str,
    ) -> Result<OtpVerifyOutcome, CacheError> {
        self.verify_inner(identifier, purpose, candidate, false).await
    }

    async fn verify_inner(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        candidate: &str,
        consume: bool,
    ) -> Result<OtpVerifyOutcome, CacheError> {
        let key = Self::key(identifier, purpose);

        let raw = match self.cache.get(&key).await? {
            Some(raw) => raw,
            None => return Ok(OtpVerifyOutcome::Expired),
        };

        let mut record: OtpRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(_) => {
                self.cache.del(&key).await?;
                return Ok(OtpVerifyOutcome::Expired);
            }
        };

        if record.attempts >= MAX_OTP_ATTEMPTS {
            self.cache.del(&key).await?;
            return Ok(OtpVerifyOutcome::TooManyAttempts);
        }

        if hash_otp(candidate) != record.hashed_otp {
            record.attempts += 1;
            if record.attempts >= MAX_OTP_ATTEMPTS {
                self.cache.del(&key).await?;
                return Ok(OtpVerifyOutcome::TooManyAttempts);
            }
            let payload = serde_json::to_string(&record)
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            self.cache.set_keep_ttl(&key, &payload).await?;
            return Ok(OtpVerifyOutcome::Invalid);
        }

        if consume {
            self.cache.del(&key).await?;
        }
        Ok(OtpVerifyOutcome::Valid)
    }
}

/// Uniformly random over 000000-999999, left-padded.
fn generate_otp() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}

fn hash_otp(otp: &str) -> String {
    let digest = Sha256::digest(otp.as_bytes());
    hex::encode(digest)
}
