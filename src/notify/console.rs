//! Console mailer for development.
//!
//! Logs emails instead of sending them. Not for production: bodies may
//! contain addresses and account details that would land in captured logs.

use crate::error::Result;
use async_trait::async_trait;

use super::mailer::{Email, Mailer};

/// A mailer that logs emails instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body_len = email.text.len(),
            "console mailer: email not sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_mailer_accepts_valid_email() {
        let mailer = ConsoleMailer::new();
        let email = Email::new("noreply@example.com", "user@example.com", "Hi").text("Body");
        assert!(mailer.send(&email).await.is_ok());
    }

    #[tokio::test]
    async fn test_console_mailer_rejects_invalid_email() {
        let mailer = ConsoleMailer::new();
        let email = Email::new("", "user@example.com", "Hi");
        assert!(mailer.send(&email).await.is_err());
    }
}
