use std::sync::Arc;

use secure_auth::config::{init_db, Config};
use secure_auth::modules::auth::crud::{
    MySqlBackupCodeRepository, MySqlSessionRepository, MySqlUserRepository,
};
use secure_auth::modules::auth::service::AuthService;
use secure_auth::services::cache::RedisStore;
use secure_auth::services::cookies::CookiePolicy;
use secure_auth::services::jwt::TokenIssuer;
use secure_auth::services::mailer::{
    spawn_mail_worker, LogTransport, MailRetryConfig, MailTransport, SmtpTransport,
};
use secure_auth::services::secret_cipher::SecretCipher;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secure_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url)
        .await
        .expect("Failed to connect to MySQL");
    tracing::info!("Connected to MySQL");

    let cache = Arc::new(RedisStore::new(&config.redis_url).expect("Failed to connect to Redis"));
    tracing::info!("Connected to Redis");

    let transport: Arc<dyn MailTransport> = match config.smtp.clone() {
        Some(smtp) => Arc::new(SmtpTransport::new(smtp)),
        None => {
            tracing::warn!("SMTP not configured, mail goes to the log");
            Arc::new(LogTransport)
        }
    };
    let (mailer, _mail_worker) = spawn_mail_worker(transport, MailRetryConfig::default());

    let tokens = TokenIssuer::new(
        config.access_token_secret.clone(),
        config.refresh_token_secret.clone(),
        config.temp_token_secret.clone(),
    );
    let cipher = SecretCipher::new(&config.app_secret_key);

    let auth = AuthService::new(
        Arc::new(MySqlUserRepository::new(db.clone())),
        Arc::new(MySqlSessionRepository::new(db.clone())),
        Arc::new(MySqlBackupCodeRepository::new(db)),
        cache,
        tokens,
        cipher,
        mailer,
    );

    let app = secure_auth::create_app(auth, CookiePolicy::new(config.production)).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
