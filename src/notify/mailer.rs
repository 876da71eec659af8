//! Mailer trait for sending transactional email.
//!
//! Abstracts the delivery backend so SMTP can be swapped for console output
//! in development or a recording double in tests.

use crate::error::{PlanholdError, Result};
use async_trait::async_trait;

/// A plain-text email message.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address (e.g., "noreply@example.com")
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain text body
    pub text: String,
}

impl Email {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: String::new(),
        }
    }

    /// Set the plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = body.into();
        self
    }

    /// Validate the email has required fields.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(PlanholdError::validation("Email 'from' is required"));
        }
        if self.to.is_empty() {
            return Err(PlanholdError::validation("Email 'to' is required"));
        }
        if self.subject.is_empty() {
            return Err(PlanholdError::validation("Email 'subject' is required"));
        }
        Ok(())
    }
}

/// Mailer trait for sending emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an email. Returns an error if delivery failed; callers decide
    /// whether failure matters (lifecycle notifications swallow it).
    async fn send(&self, email: &Email) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_builder() {
        let email = Email::new("noreply@example.com", "user@example.com", "Welcome")
            .text("Hello there");
        assert_eq!(email.to, "user@example.com");
        assert_eq!(email.text, "Hello there");
        assert!(email.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_fields() {
        let email = Email::new("", "user@example.com", "Welcome");
        assert!(email.validate().is_err());

        let email = Email::new("noreply@example.com", "", "Welcome");
        assert!(email.validate().is_err());

        let email = Email::new("noreply@example.com", "user@example.com", "");
        assert!(email.validate().is_err());
    }
}
