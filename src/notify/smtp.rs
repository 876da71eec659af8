//! SMTP mailer using lettre.

use crate::error::{PlanholdError, Result};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::mailer::{Email, Mailer};

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port (default: 587 for STARTTLS)
    pub port: u16,
    /// Username for authentication
    pub username: Option<String>,
    /// Password for authentication
    pub password: Option<String>,
    /// Default "from" address
    pub default_from: Option<String>,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            username: None,
            password: None,
            default_from: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.default_from = Some(address.into());
        self
    }

    /// Create config from environment variables.
    ///
    /// Reads `SMTP_HOST` (required), `SMTP_PORT`, `SMTP_USERNAME`,
    /// `SMTP_PASSWORD`, and `SMTP_FROM`.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| PlanholdError::internal("SMTP_HOST environment variable not set"))?;

        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);

        Ok(Self {
            host,
            port,
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            default_from: std::env::var("SMTP_FROM").ok(),
        })
    }
}

/// SMTP mailer sending plain-text mail over STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                PlanholdError::internal(format!("Failed to create SMTP transport: {}", e))
            })?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SmtpConfig::from_env()?)
    }

    fn build_message(&self, email: &Email) -> Result<Message> {
        let from_str = if email.from.is_empty() {
            self.config.default_from.as_ref().ok_or_else(|| {
                PlanholdError::validation("No 'from' address specified and no default configured")
            })?
        } else {
            &email.from
        };

        let from: Mailbox = from_str
            .parse()
            .map_err(|e| PlanholdError::validation(format!("Invalid 'from' address: {}", e)))?;

        let to: Mailbox = email.to.parse().map_err(|e| {
            PlanholdError::validation(format!("Invalid 'to' address '{}': {}", email.to, e))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.text.clone())
            .map_err(|e| PlanholdError::internal(format!("Failed to build email: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;

        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| PlanholdError::internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}
