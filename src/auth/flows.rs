//! Registration and login flows.

use serde::Deserialize;
use std::sync::Arc;

use super::password::{PasswordHasher, PasswordPolicy};
use super::session::Sessions;
use crate::error::{PlanholdError, Result};
use crate::notify::Notifier;
use crate::store::{NewUser, Role, Store, UserRecord};

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `user` when omitted.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Handles registration, login, and logout.
pub struct AuthService {
    store: Arc<dyn Store>,
    sessions: Sessions,
    notifier: Arc<dyn Notifier>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, sessions: Sessions, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            sessions,
            notifier,
            hasher: PasswordHasher::default(),
            policy: PasswordPolicy::default(),
        }
    }

    /// Swap the password hasher (tests use the fast profile).
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register a new user.
    pub async fn register(&self, req: RegisterRequest) -> Result<UserRecord> {
        if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
            return Err(PlanholdError::validation("All fields required"));
        }

        let email = req.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(PlanholdError::validation("Invalid email format"));
        }

        self.policy.check(&req.password)?;

        let hash = self.hasher.hash(&req.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                name: req.name.trim().to_string(),
                email,
                password_hash: hash,
                role: req.role.unwrap_or(Role::User),
            })
            .await?;

        tracing::info!(user_id = user.id, "user registered");

        // Welcome email is best-effort; registration already succeeded.
        self.notifier
            .notify(
                &user.email,
                "Welcome to Planhold",
                &format!(
                    "Welcome {}, you have successfully registered! Please login with your details.",
                    user.name
                ),
            )
            .await;

        Ok(user)
    }

    /// Authenticate and issue a session.
    ///
    /// Returns the user and the new session id. Failures are uniform
    /// ("Invalid credentials") so callers cannot distinguish an unknown
    /// email from a wrong password.
    pub async fn login(&self, req: LoginRequest) -> Result<(UserRecord, String)> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(PlanholdError::validation("Email and password required"));
        }

        let email = req.email.trim().to_lowercase();

        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                // Hash anyway so the unknown-email path takes as long as a
                // failed verify (user enumeration via timing).
                let _ = self.hasher.hash("dummy-password");
                return Err(PlanholdError::unauthorized("Invalid credentials"));
            }
        };

        if !self.hasher.verify(&req.password, &user.password_hash)? {
            return Err(PlanholdError::unauthorized("Invalid credentials"));
        }

        let session_id = self
            .sessions
            .create(user.id, &user.name, user.role)
            .await?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok((user, session_id))
    }

    /// Revoke a session.
    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.sessions.revoke(session_id).await
    }
}

/// Basic email validation: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
