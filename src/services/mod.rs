pub mod backup_codes;
pub mod cache;
pub mod cookies;
pub mod device;
pub mod hashing;
pub mod jwt;
pub mod mailer;
pub mod otp;
pub mod rate_limit;
pub mod secret_cipher;
pub mod security;
pub mod totp;
