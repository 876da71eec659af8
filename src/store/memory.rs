//! In-memory store for tests and dev mode.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    NewPlan, NewSubscription, NewUser, PlanRecord, PlanSubscriptionCount, Store, SubscriptionFilter,
    SubscriptionRecord, SubscriptionUpdate, UserRecord,
};
use crate::error::{PlanholdError, Result};

#[derive(Default)]
struct Tables {
    users: HashMap<i64, UserRecord>,
    plans: HashMap<i64, PlanRecord>,
    subscriptions: HashMap<i64, SubscriptionRecord>,
    next_user_id: i64,
    next_plan_id: i64,
    next_subscription_id: i64,
}

/// HashMap-backed [`Store`]. Data is lost on drop and not shared across
/// processes; suitable for tests and development only.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(PlanholdError::validation("Email already registered"));
        }
        tables.next_user_id += 1;
        let record = UserRecord {
            id: tables.next_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_plan(&self, id: i64) -> Result<Option<PlanRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.plans.get(&id).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<PlanRecord>> {
        let tables = self.tables.read().await;
        let mut plans: Vec<_> = tables.plans.values().cloned().collect();
        plans.sort_by_key(|p| p.id);
        Ok(plans)
    }

    async fn insert_plan(&self, plan: NewPlan) -> Result<PlanRecord> {
        let mut tables = self.tables.write().await;
        tables.next_plan_id += 1;
        let record = PlanRecord {
            id: tables.next_plan_id,
            name: plan.name,
            description: plan.description,
            quota: plan.quota,
            price_cents: plan.price_cents,
        };
        tables.plans.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.subscriptions.get(&id).cloned())
    }

    async fn insert_subscription(&self, sub: NewSubscription) -> Result<SubscriptionRecord> {
        let mut tables = self.tables.write().await;
        tables.next_subscription_id += 1;
        let record = SubscriptionRecord {
            id: tables.next_subscription_id,
            user_id: sub.user_id,
            plan_id: sub.plan_id,
            start_date: sub.start_date,
            end_date: sub.end_date,
            status: sub.status,
        };
        tables.subscriptions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_subscription(&self, id: i64, update: SubscriptionUpdate) -> Result<()> {
        let mut tables = self.tables.write().await;
        let sub = tables
            .subscriptions
            .get_mut(&id)
            .ok_or_else(|| PlanholdError::not_found(format!("Subscription {}", id)))?;

        if let Some(plan_id) = update.plan_id {
            sub.plan_id = plan_id;
        }
        if let Some(start_date) = update.start_date {
            sub.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            sub.end_date = end_date;
        }
        if let Some(status) = update.status {
            sub.status = status;
        }
        Ok(())
    }

    async fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionRecord>> {
        let tables = self.tables.read().await;
        let mut subs: Vec<_> = tables
            .subscriptions
            .values()
            .filter(|s| filter.user_id.map_or(true, |uid| s.user_id == uid))
            .cloned()
            .collect();
        subs.sort_by_key(|s| s.id);
        Ok(subs)
    }

    async fn count_subscriptions_by_plan(&self) -> Result<Vec<PlanSubscriptionCount>> {
        let tables = self.tables.read().await;
        let mut counts: HashMap<i64, u64> = HashMap::new();
        for sub in tables.subscriptions.values() {
            *counts.entry(sub.plan_id).or_default() += 1;
        }

        let mut ranked: Vec<_> = counts
            .into_iter()
            .filter_map(|(plan_id, subscriptions)| {
                tables.plans.get(&plan_id).map(|plan| PlanSubscriptionCount {
                    plan_id,
                    plan_name: plan.name.clone(),
                    subscriptions,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.subscriptions.cmp(&a.subscriptions));
        Ok(ranked)
    }
}
