//! Session management.
//!
//! Sessions carry the authenticated actor's identity for the 4-hour window
//! the original cookie sessions lived. Storage is behind [`SessionStore`]
//! so a shared backend can replace the in-memory map without touching the
//! boundary layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::Role;
use crate::utils::get_env_with_prefix;

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Session TTL in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Session cookie name.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie secure flag (HTTPS only).
    #[serde(default = "default_secure")]
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            cookie_name: default_cookie_name(),
            cookie_secure: default_secure(),
        }
    }
}

impl SessionConfig {
    /// Load session configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ttl) = get_env_with_prefix("SESSION_TTL_SECONDS") {
            if let Ok(seconds) = ttl.parse() {
                config.ttl_seconds = seconds;
            }
        }
        if let Some(name) = get_env_with_prefix("SESSION_COOKIE_NAME") {
            config.cookie_name = name;
        }
        if let Some(secure) = get_env_with_prefix("SESSION_COOKIE_SECURE") {
            config.cookie_secure = secure.parse().unwrap_or(true);
        }

        config
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn default_ttl_seconds() -> u64 {
    4 * 3600 // 4 hours
}

fn default_cookie_name() -> String {
    "planhold_session".to_string()
}

fn default_secure() -> bool {
    true
}

/// Data stored per session: the authenticated actor plus expiry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub name: String,
    pub role: Role,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl SessionData {
    pub fn new(user_id: i64, name: impl Into<String>, role: Role, ttl: Duration) -> Self {
        let now = SystemTime::now();
        Self {
            user_id,
            name: name.into(),
            role,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() > self.expires_at
    }
}

/// Session storage trait.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load session data by session ID.
    ///
    /// Returns `Ok(None)` if the session doesn't exist or has expired.
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>>;

    /// Save session data under a session ID.
    async fn save(&self, session_id: &str, data: SessionData) -> Result<()>;

    /// Delete a session.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Clean up expired sessions, returning how many were removed.
    async fn cleanup_expired(&self) -> Result<usize>;
}

/// In-memory session store.
///
/// Sessions are lost on restart and not shared across instances.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>> {
        let sessions = self.sessions.read().await;

        if let Some(session) = sessions.get(session_id) {
            if session.is_expired() {
                drop(sessions);
                let mut sessions = self.sessions.write().await;
                sessions.remove(session_id);
                return Ok(None);
            }
            Ok(Some(session.clone()))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, session_id: &str, data: SessionData) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id.to_string(), data);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let initial_len = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok(initial_len - sessions.len())
    }
}

/// Issues, resolves, and revokes sessions.
#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a session for an authenticated actor, returning its id.
    pub async fn create(&self, user_id: i64, name: &str, role: Role) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let data = SessionData::new(user_id, name, role, self.config.ttl());
        self.store.save(&session_id, data).await?;
        Ok(session_id)
    }

    /// Resolve a session id; `None` if absent or expired.
    pub async fn resolve(&self, session_id: &str) -> Result<Option<SessionData>> {
        self.store.load(session_id).await
    }

    /// Revoke a session.
    pub async fn revoke(&self, session_id: &str) -> Result<()> {
        self.store.delete(session_id).await
    }

    /// Build the Set-Cookie value for a freshly issued session.
    pub fn cookie(&self, session_id: &str) -> cookie::Cookie<'static> {
        cookie::Cookie::build((self.config.cookie_name.clone(), session_id.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.config.cookie_secure)
            .max_age(cookie::time::Duration::seconds(
                i64::try_from(self.config.ttl_seconds).unwrap_or(i64::MAX),
            ))
            .build()
    }

    /// Build the Set-Cookie value that clears the session cookie.
    pub fn removal_cookie(&self) -> cookie::Cookie<'static> {
        let mut cookie = cookie::Cookie::new(self.config.cookie_name.clone(), "");
        cookie.set_path("/");
        cookie.make_removal();
        cookie
    }
}
