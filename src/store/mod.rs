//! Storage interface for users, plans, and subscriptions.
//!
//! The lifecycle manager talks to persistence through the [`Store`] trait.
//! A SeaORM-backed implementation provides production persistence; an
//! in-memory implementation backs tests and dev mode.

mod memory;
mod sea_orm_store;

pub use memory::InMemoryStore;
pub use sea_orm_store::SeaOrmStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Role attached to a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse from a stored role string. Unknown values fall back to `User`,
    /// the least privileged role.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Subscription is live (set on create/upgrade/downgrade).
    Active,
    /// Cancelled by the owner; `end_date` keeps its prior value.
    Cancelled,
    /// Renewed for another cycle.
    Renewed,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Renewed => "renewed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => Self::Cancelled,
            "renewed" => Self::Renewed,
            _ => Self::Active,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    /// Stored lowercase; unique.
    pub email: String,
    /// Argon2id PHC string. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A persisted plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Usage quota granted by the plan (units are application-defined).
    pub quota: u32,
    /// Price in minor currency units, compared exactly by the lifecycle
    /// rules.
    pub price_cents: i64,
}

/// Fields for creating a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub quota: u32,
    pub price_cents: i64,
}

/// A persisted subscription. Never physically deleted; lifecycle actions
/// mutate `status` and the date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SubscriptionStatus,
}

/// Fields for creating a subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: i64,
    pub plan_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SubscriptionStatus,
}

/// Partial update applied to a subscription. `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub plan_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
}

/// Filter for listing subscriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionFilter {
    /// Restrict to one owner; `None` lists everything.
    pub user_id: Option<i64>,
}

impl SubscriptionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn owned_by(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}

/// Subscription count per plan, for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSubscriptionCount {
    pub plan_id: i64,
    pub plan_name: String,
    pub subscriptions: u64,
}

/// Persistence operations required by the lifecycle manager and the
/// auth/plan/dashboard layers.
///
/// Object-safe so the application can hold `Arc<dyn Store>` and tests can
/// swap in [`InMemoryStore`].
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>>;

    /// Lookup by email (expects the caller to lowercase).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Insert a user; fails with a validation error if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord>;

    // Plans

    async fn find_plan(&self, id: i64) -> Result<Option<PlanRecord>>;

    async fn list_plans(&self) -> Result<Vec<PlanRecord>>;

    async fn insert_plan(&self, plan: NewPlan) -> Result<PlanRecord>;

    // Subscriptions

    async fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>>;

    async fn insert_subscription(&self, sub: NewSubscription) -> Result<SubscriptionRecord>;

    /// Apply a partial update; fails with `NotFound` if the id is absent.
    async fn update_subscription(&self, id: i64, update: SubscriptionUpdate) -> Result<()>;

    async fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionRecord>>;

    /// Subscription counts grouped by plan, descending.
    async fn count_subscriptions_by_plan(&self) -> Result<Vec<PlanSubscriptionCount>>;
}
