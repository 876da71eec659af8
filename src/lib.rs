//! Planhold - subscription management web service.
//!
//! Users register, authenticate with session cookies, browse plans, and
//! manage subscriptions through a fixed 30-day billing cycle
//! (subscribe/upgrade/downgrade/cancel/renew). Administrators create plans
//! and read aggregate dashboards. State changes trigger best-effort email
//! notifications.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use planhold::auth::{InMemorySessionStore, SessionConfig, Sessions};
//! use planhold::http::{AppState, build_router};
//! use planhold::notify::{ConsoleMailer, MailNotifier};
//! use planhold::store::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     planhold::init_tracing();
//!
//!     let store = Arc::new(InMemoryStore::new());
//!     let notifier = Arc::new(MailNotifier::new(
//!         Arc::new(ConsoleMailer::new()),
//!         "noreply@example.com",
//!     ));
//!     let sessions = Sessions::new(
//!         Arc::new(InMemorySessionStore::new()),
//!         SessionConfig::default(),
//!     );
//!
//!     let app = build_router(AppState::new(store, notifier, sessions));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod auth;
mod config;
pub mod dashboard;
mod error;
pub mod http;
pub mod notify;
pub mod plans;
pub mod store;
pub mod subscriptions;
mod utils;

// Re-exports for the public API
pub use config::{Config, ConfigBuilder, DatabaseConfig, LoggingConfig, ServerConfig};
pub use error::{PlanholdError, Result};
pub use http::{ApiResponse, AppState, build_router};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults.
///
/// Call early in `main()`, before building the app.
///
/// # Environment Variables
///
/// - `RUST_LOG`: log level filter (e.g., "info", "planhold=debug")
/// - `PLANHOLD_LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("PLANHOLD_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing from a [`Config`].
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
