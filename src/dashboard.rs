//! Admin dashboard aggregates.

use std::sync::Arc;

use crate::error::Result;
use crate::store::{PlanSubscriptionCount, Store};

/// Default number of plans shown on the dashboard.
pub const DEFAULT_TOP_PLANS: usize = 5;

/// Aggregate queries backing the admin dashboard.
pub struct Dashboard {
    store: Arc<dyn Store>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Plans ranked by subscription count, descending, truncated to `limit`.
    pub async fn top_plans(&self, limit: usize) -> Result<Vec<PlanSubscriptionCount>> {
        let mut ranked = self.store.count_subscriptions_by_plan().await?;
        ranked.truncate(limit);
        Ok(ranked)
    }
}
