use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access tokens authorize protected endpoints and carry the session they
/// were minted for.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub email: String,
    pub is2fa: bool,
    /// Session the token belongs to.
    pub sid: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Refresh tokens deliberately omit the session id; the session id travels
/// out-of-band so a captured refresh token cannot be replayed against a
/// different session record.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub email: String,
    pub is2fa: bool,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Short-lived token representing the TWO_FACTOR_PENDING login state.
#[derive(Debug, Serialize, Deserialize)]
pub struct TempClaims {
    pub sub: String,
    pub email: String,
    pub is2fa: bool,
    /// Always "2fa"; keeps the token unusable as an access token.
    pub purpose: String,
    pub exp: i64,
    pub iat: i64,
}

pub const ACCESS_TOKEN_TTL_SECS: i64 = 5 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
pub const TEMP_TOKEN_TTL_SECS: i64 = 5 * 60;

pub const TEMP_TOKEN_PURPOSE: &str = "2fa";

/// Signs and verifies the three token kinds with distinct secrets, so
/// leaking one kind never forges another. Verification fails closed: any
/// signature or expiry failure reads as "no token".
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    temp_secret: String,
}

impl TokenIssuer {
    pub fn new(access_secret: String, refresh_secret: String, temp_secret: String) -> Self {
        Self {
            access_secret,
            refresh_secret,
            temp_secret,
        }
    }

    pub fn create_access_token(
        &self,
        user_id: &str,
        email: &str,
        is2fa: bool,
        session_id: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            is2fa,
            sid: session_id.to_string(),
            exp: (now + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.access_secret.as_bytes()),
        )
    }

    pub fn create_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        is2fa: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            is2fa,
            exp: (now + Duration::seconds(REFRESH_TOKEN_TTL_SECS)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.refresh_secret.as_bytes()),
        )
    }

    pub fn create_temp_token(
        &self,
        user_id: &str,
        email: &str,
        is2fa: bool,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = TempClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            is2fa,
            purpose: TEMP_TOKEN_PURPOSE.to_string(),
            exp: (now + Duration::seconds(TEMP_TOKEN_TTL_SECS)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.temp_secret.as_bytes()),
        )
    }

    pub fn verify_access_token(&self, token: &str) -> Option<AccessClaims> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .ok()
    }

    pub fn verify_refresh_token(&self, token: &str) -> Option<RefreshClaims> {
        decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .ok()
    }

    pub fn verify_temp_token(&self, token: &str) -> Option<TempClaims> {
        decode::<TempClaims>(
            token,
            &DecodingKey::from_secret(self.temp_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .ok()
        .filter(|claims| claims.purpose == TEMP_TOKEN_PURPOSE)
    }
}
