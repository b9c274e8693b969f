use totp_rs::{Algorithm, Secret, SecretParseError, TotpUrlError, TOTP};

pub const TOTP_ISSUER: &str = "Secure Auth";

#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    #[error("Invalid TOTP secret")]
    BadSecret,
    #[error("TOTP configuration error: {0}")]
    Config(String),
}

impl From<SecretParseError> for TotpError {
    fn from(_: SecretParseError) -> Self {
        TotpError::BadSecret
    }
}

impl From<TotpUrlError> for TotpError {
    fn from(e: TotpUrlError) -> Self {
        TotpError::Config(format!("{e:?}"))
    }
}

/// RFC 6238 codes: SHA-1, 6 digits, 30-second step, ±1 step of clock drift.
fn build(secret_base32: &str, account: &str) -> Result<TOTP, TotpError> {
    let secret = Secret::Encoded(secret_base32.to_string()).to_bytes()?;
    Ok(TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some(TOTP_ISSUER.to_string()),
        account.to_string(),
    )?)
}

/// Fresh base32 secret for authenticator-app enrollment.
pub fn generate_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

/// otpauth:// provisioning URI for QR display.
pub fn key_uri(email: &str, secret_base32: &str) -> Result<String, TotpError> {
    Ok(build(secret_base32, email)?.get_url())
}

pub fn verify(candidate: &str, secret_base32: &str) -> Result<bool, TotpError> {
    let totp = build(secret_base32, "")?;
    totp.check_current(candidate)
        .map_err(|e| TotpError::Config(e.to_string()))
}
