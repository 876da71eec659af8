//! HTTP boundary layer.
//!
//! Maps JSON requests onto lifecycle operations and typed errors onto
//! status codes. Handlers hold no business rules; authorization beyond
//! "is there a session" lives in the lifecycle and catalog layers.

mod response;
mod routes;

pub use response::ApiResponse;
pub use routes::build_router;

use std::sync::Arc;

use crate::auth::{AuthService, Sessions};
use crate::dashboard::Dashboard;
use crate::plans::PlanCatalog;
use crate::subscriptions::SubscriptionLifecycle;

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub lifecycle: Arc<SubscriptionLifecycle>,
    pub plans: Arc<PlanCatalog>,
    pub dashboard: Arc<Dashboard>,
    pub sessions: Sessions,
}

impl AppState {
    /// Wire up the service layers over a store, notifier, and session
    /// manager.
    pub fn new(
        store: Arc<dyn crate::store::Store>,
        notifier: Arc<dyn crate::notify::Notifier>,
        sessions: Sessions,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(
                store.clone(),
                sessions.clone(),
                notifier.clone(),
            )),
            lifecycle: Arc::new(SubscriptionLifecycle::new(store.clone(), notifier)),
            plans: Arc::new(PlanCatalog::new(store.clone())),
            dashboard: Arc::new(Dashboard::new(store)),
            sessions,
        }
    }

    /// Replace the auth service (tests swap in a fast password hasher).
    pub fn with_auth(mut self, auth: AuthService) -> Self {
        self.auth = Arc::new(auth);
        self
    }
}
