//! Best-effort notifications.
//!
//! Lifecycle mutations and registration trigger transactional emails. The
//! [`Notifier`] is fire-and-forget: delivery failures are logged and never
//! propagate to the caller, so a down mail server cannot fail a committed
//! mutation.

mod console;
mod mailer;
mod smtp;

pub use console::ConsoleMailer;
pub use mailer::{Email, Mailer};
pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Best-effort notification sender.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver (or enqueue) a notification. Infallible by contract:
    /// implementations log failures instead of returning them.
    async fn notify(&self, to_email: &str, subject: &str, body: &str);
}

/// Notifier that delivers through a [`Mailer`].
///
/// The actual send runs on a detached task so the request returns without
/// waiting on SMTP.
pub struct MailNotifier {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl MailNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn notify(&self, to_email: &str, subject: &str, body: &str) {
        if to_email.is_empty() {
            tracing::warn!("notify: no recipient specified");
            return;
        }

        let email = Email::new(self.from.clone(), to_email, subject).text(body);
        let mailer = Arc::clone(&self.mailer);
        let to = to_email.to_string();

        tokio::spawn(async move {
            match mailer.send(&email).await {
                Ok(()) => tracing::debug!(to = %to, "notification sent"),
                Err(e) => tracing::warn!(to = %to, error = %e, "failed to send notification"),
            }
        });
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Test notifier that records notifications synchronously.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, to_email: &str, subject: &str, body: &str) {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(SentNotification {
                to: to_email.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
    }
}
