use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Closed set of outbound notifications. Adding a kind means adding a
/// variant, not a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailJob {
    Welcome {
        name: String,
        email: String,
    },
    AccountVerify {
        name: String,
        email: String,
        otp: String,
    },
    PasswordReset {
        name: String,
        email: String,
        otp: String,
    },
    PasswordResetAlert {
        name: String,
        email: String,
    },
    TwoFaEnableAlert {
        name: String,
        email: String,
    },
    TwoFaDisableAlert {
        name: String,
        email: String,
    },
}

impl MailJob {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "WELCOME",
            Self::AccountVerify { .. } => "ACCOUNT_VERIFY",
            Self::PasswordReset { .. } => "PASSWORD_RESET",
            Self::PasswordResetAlert { .. } => "PASSWORD_RESET_ALERT",
            Self::TwoFaEnableAlert { .. } => "TWO_FA_ENABLE_ALERT",
            Self::TwoFaDisableAlert { .. } => "TWO_FA_DISABLE_ALERT",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Self::Welcome { email, .. }
            | Self::AccountVerify { email, .. }
            | Self::PasswordReset { email, .. }
            | Self::PasswordResetAlert { email, .. }
            | Self::TwoFaEnableAlert { email, .. }
            | Self::TwoFaDisableAlert { email, .. } => email,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "Welcome aboard",
            Self::AccountVerify { .. } => "Verify your account",
            Self::PasswordReset { .. } => "Password reset code",
            Self::PasswordResetAlert { .. } => "Your password was reset",
            Self::TwoFaEnableAlert { .. } => "Two-factor authentication enabled",
            Self::TwoFaDisableAlert { .. } => "Two-factor authentication disabled",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Self::Welcome { name, .. } => {
                format!("Hi {name},\n\nYour account is verified and ready to use.")
            }
            Self::AccountVerify { name, otp, .. } => format!(
                "Hi {name},\n\nYour verification code is {otp}. It expires in 5 minutes."
            ),
            Self::PasswordReset { name, otp, .. } => format!(
                "Hi {name},\n\nYour password reset code is {otp}. It expires in 5 minutes.\n\nIf you did not request this, you can ignore this email."
            ),
            Self::PasswordResetAlert { name, .. } => format!(
                "Hi {name},\n\nYour password was just reset and all sessions were signed out. If this wasn't you, contact support immediately."
            ),
            Self::TwoFaEnableAlert { name, .. } => format!(
                "Hi {name},\n\nTwo-factor authentication was enabled on your account. If this wasn't you, contact support immediately."
            ),
            Self::TwoFaDisableAlert { name, .. } => format!(
                "Hi {name},\n\nTwo-factor authentication was disabled on your account. If this wasn't you, contact support immediately."
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Mail delivery failed: {0}")]
pub struct MailError(pub String);

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, job: &MailJob) -> Result<(), MailError>;
}

/// Transport used when no SMTP credentials are configured: delivery is a
/// structured log line. The real SMTP hop lives outside this service's
/// boundary.
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, job: &MailJob) -> Result<(), MailError> {
        tracing::info!(kind = job.kind(), to = job.recipient(), "mail dispatched");
        Ok(())
    }
}

/// SMTP delivery over STARTTLS. Each send builds a fresh connection; the
/// queue volume here never justifies pooling.
pub struct SmtpTransport {
    config: crate::config::environment::SmtpConfig,
}

impl SmtpTransport {
    pub fn new(config: crate::config::environment::SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, job: &MailJob) -> Result<(), MailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(
                self.config
                    .sender
                    .parse()
                    .map_err(|e| MailError(format!("bad sender address: {e}")))?,
            )
            .to(job
                .recipient()
                .parse()
                .map_err(|e| MailError(format!("bad recipient address: {e}")))?)
            .subject(job.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(job.body())
            .map_err(|e| MailError(e.to_string()))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| MailError(e.to_string()))?
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(email).await.map_err(|e| MailError(e.to_string()))?;
        tracing::info!(kind = job.kind(), to = job.recipient(), "mail sent");
        Ok(())
    }
}

/// Delivery retry policy: 3 attempts, exponential backoff starting at 2s.
#[derive(Debug, Clone)]
pub struct MailRetryConfig {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
}

impl Default for MailRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 2,
        }
    }
}

impl MailRetryConfig {
    /// delay = base_delay × 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_delay_secs * 2u64.pow(attempt))
    }
}

/// Fire-and-forget enqueue handle. Flows never block on delivery and an
/// enqueue failure never fails the surrounding request.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::UnboundedSender<MailJob>,
}

impl Mailer {
    pub fn enqueue(&self, job: MailJob) {
        if let Err(e) = self.tx.send(job) {
            tracing::warn!("mail queue closed, dropping job: {e}");
        }
    }
}

/// Builds the queue and its consumer task. The consumer pulls typed jobs and
/// dispatches them through the transport with retry/backoff.
pub fn spawn_mail_worker(
    transport: Arc<dyn MailTransport>,
    retry: MailRetryConfig,
) -> (Mailer, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<MailJob>();

    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let mut attempt = 0;
            loop {
                match transport.send(&job).await {
                    Ok(()) => break,
                    Err(e) => {
                        attempt += 1;
                        if attempt >= retry.max_attempts {
                            tracing::error!(
                                kind = job.kind(),
                                to = job.recipient(),
                                "mail dropped after {attempt} attempts: {e}"
                            );
                            break;
                        }
                        let delay = retry.delay_for(attempt - 1);
                        tracing::warn!(
                            kind = job.kind(),
                            "mail attempt {attempt} failed, retrying in {delay:?}: {e}"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    });

    (Mailer { tx }, handle)
}
