use std::env;

/// Environment configuration
/// Loads and validates environment variables
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub temp_token_secret: String,
    /// AEAD key for TOTP secrets at rest, 32 bytes decoded from hex.
    pub app_secret_key: [u8; 32],
    pub production: bool,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub sender: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| "ACCESS_TOKEN_SECRET must be set".to_string())?;

        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| "REFRESH_TOKEN_SECRET must be set".to_string())?;

        let temp_token_secret = env::var("TEMP_TOKEN_SECRET")
            .map_err(|_| "TEMP_TOKEN_SECRET must be set".to_string())?;

        // A missing or malformed AEAD key is a startup failure, never a
        // runtime one.
        let raw_key =
            env::var("APP_SECRET_KEY").map_err(|_| "APP_SECRET_KEY must be set".to_string())?;
        let key_bytes = hex::decode(raw_key.trim())
            .map_err(|_| "APP_SECRET_KEY must be hex-encoded".to_string())?;
        let app_secret_key: [u8; 32] = key_bytes
            .try_into()
            .map_err(|_| "APP_SECRET_KEY must decode to exactly 32 bytes".to_string())?;

        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let smtp = match (
            env::var("SMTP_HOST"),
            env::var("SMTP_USER"),
            env::var("SMTP_PASS"),
            env::var("SENDER_EMAIL"),
        ) {
            (Ok(host), Ok(username), Ok(password), Ok(sender)) => Some(SmtpConfig {
                host,
                username,
                password,
                sender,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            redis_url,
            access_token_secret,
            refresh_token_secret,
            temp_token_secret,
            app_secret_key,
            production,
            smtp,
        })
    }
}
