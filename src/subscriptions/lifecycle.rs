//! Subscription lifecycle operations.
//!
//! Every operation takes the authenticated [`Actor`] explicitly and runs an
//! authorization check before touching the store. Mutations commit first;
//! the matching notification is dispatched afterwards and can never undo a
//! committed change.

use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;

use super::error::SubscriptionError;
use crate::auth::Actor;
use crate::error::Result;
use crate::notify::Notifier;
use crate::store::{
    NewSubscription, PlanRecord, Role, Store, SubscriptionFilter, SubscriptionRecord,
    SubscriptionStatus, SubscriptionUpdate,
};

/// Length of the fixed billing cycle, in days.
pub const BILLING_CYCLE_DAYS: u64 = 30;

/// Subscription lifecycle manager.
pub struct SubscriptionLifecycle {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl SubscriptionLifecycle {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Subscribe the actor to a plan.
    pub async fn subscribe(&self, actor: &Actor, plan_id: i64) -> Result<SubscriptionRecord> {
        require_user_role(actor)?;

        let plan = self.find_plan(plan_id).await?;

        let start_date = today();
        let end_date = cycle_end(start_date);

        let sub = self
            .store
            .insert_subscription(NewSubscription {
                user_id: actor.id,
                plan_id: plan.id,
                start_date,
                end_date,
                status: SubscriptionStatus::Active,
            })
            .await?;

        tracing::info!(
            subscription_id = sub.id,
            user_id = actor.id,
            plan_id = plan.id,
            "subscription created"
        );

        self.notify_actor(
            actor,
            "Subscription Successful",
            format!(
                "Hello {},\n\nYou have successfully subscribed to {} from {} until {}.",
                actor.name, plan.name, start_date, end_date
            ),
        )
        .await;

        Ok(sub)
    }

    /// Move a subscription to a strictly higher-priced plan.
    ///
    /// Resets the billing window and reactivates the subscription.
    pub async fn upgrade(
        &self,
        actor: &Actor,
        subscription_id: i64,
        new_plan_id: i64,
    ) -> Result<SubscriptionRecord> {
        self.change_plan(actor, subscription_id, new_plan_id, PlanChange::Upgrade)
            .await
    }

    /// Move a subscription to a strictly lower-priced plan.
    pub async fn downgrade(
        &self,
        actor: &Actor,
        subscription_id: i64,
        new_plan_id: i64,
    ) -> Result<SubscriptionRecord> {
        self.change_plan(actor, subscription_id, new_plan_id, PlanChange::Downgrade)
            .await
    }

    /// Cancel a subscription. The end date keeps its prior value.
    pub async fn cancel(&self, actor: &Actor, subscription_id: i64) -> Result<SubscriptionRecord> {
        require_user_role(actor)?;
        let mut sub = self.owned_subscription(actor, subscription_id).await?;

        self.store
            .update_subscription(
                sub.id,
                SubscriptionUpdate {
                    status: Some(SubscriptionStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await?;
        sub.status = SubscriptionStatus::Cancelled;

        tracing::info!(subscription_id = sub.id, user_id = actor.id, "subscription cancelled");

        self.notify_actor(
            actor,
            "Subscription Cancelled",
            format!(
                "Hello {},\n\nYour subscription (ID: {}) has been cancelled.",
                actor.name, sub.id
            ),
        )
        .await;

        Ok(sub)
    }

    /// Renew a subscription for another cycle starting today.
    ///
    /// Idempotent on status; each call pushes the end date to today + 30
    /// days.
    pub async fn renew(&self, actor: &Actor, subscription_id: i64) -> Result<SubscriptionRecord> {
        require_user_role(actor)?;
        let mut sub = self.owned_subscription(actor, subscription_id).await?;

        let end_date = cycle_end(today());
        self.store
            .update_subscription(
                sub.id,
                SubscriptionUpdate {
                    end_date: Some(end_date),
                    status: Some(SubscriptionStatus::Renewed),
                    ..Default::default()
                },
            )
            .await?;
        sub.end_date = end_date;
        sub.status = SubscriptionStatus::Renewed;

        tracing::info!(subscription_id = sub.id, user_id = actor.id, "subscription renewed");

        self.notify_actor(
            actor,
            "Subscription Renewed",
            format!(
                "Hello {},\n\nYour subscription (ID: {}) has been renewed until {}.",
                actor.name, sub.id, end_date
            ),
        )
        .await;

        Ok(sub)
    }

    /// List subscriptions: all of them for an admin, the actor's own
    /// otherwise.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<SubscriptionRecord>> {
        let filter = if actor.is_admin() {
            SubscriptionFilter::all()
        } else {
            SubscriptionFilter::owned_by(actor.id)
        };
        self.store.list_subscriptions(filter).await
    }

    /// View a single subscription.
    pub async fn view(&self, actor: &Actor, subscription_id: i64) -> Result<SubscriptionRecord> {
        let sub = self
            .store
            .find_subscription(subscription_id)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound { subscription_id })?;

        if !actor.is_admin() && sub.user_id != actor.id {
            return Err(SubscriptionError::NotOwner { subscription_id }.into());
        }

        Ok(sub)
    }

    async fn change_plan(
        &self,
        actor: &Actor,
        subscription_id: i64,
        new_plan_id: i64,
        change: PlanChange,
    ) -> Result<SubscriptionRecord> {
        require_user_role(actor)?;
        let mut sub = self.owned_subscription(actor, subscription_id).await?;

        let current_plan = self.find_plan(sub.plan_id).await?;
        let new_plan = self.find_plan(new_plan_id).await?;

        change.check_prices(current_plan.price_cents, new_plan.price_cents)?;

        let start_date = today();
        let end_date = cycle_end(start_date);

        self.store
            .update_subscription(
                sub.id,
                SubscriptionUpdate {
                    plan_id: Some(new_plan.id),
                    start_date: Some(start_date),
                    end_date: Some(end_date),
                    status: Some(SubscriptionStatus::Active),
                },
            )
            .await?;
        sub.plan_id = new_plan.id;
        sub.start_date = start_date;
        sub.end_date = end_date;
        sub.status = SubscriptionStatus::Active;

        tracing::info!(
            subscription_id = sub.id,
            user_id = actor.id,
            new_plan_id = new_plan.id,
            action = change.past_tense(),
            "subscription plan changed"
        );

        self.notify_actor(
            actor,
            change.subject(),
            format!(
                "Hello {},\n\nYour subscription (ID: {}) has been {} and is valid from {} until {}.",
                actor.name,
                sub.id,
                change.past_tense(),
                start_date,
                end_date
            ),
        )
        .await;

        Ok(sub)
    }

    /// Fetch a subscription the actor owns, or fail with
    /// `NotFound`/`Forbidden`.
    async fn owned_subscription(
        &self,
        actor: &Actor,
        subscription_id: i64,
    ) -> Result<SubscriptionRecord> {
        let sub = self
            .store
            .find_subscription(subscription_id)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound { subscription_id })?;

        if sub.user_id != actor.id {
            return Err(SubscriptionError::NotOwner { subscription_id }.into());
        }

        Ok(sub)
    }

    async fn find_plan(&self, plan_id: i64) -> Result<PlanRecord> {
        Ok(self
            .store
            .find_plan(plan_id)
            .await?
            .ok_or(SubscriptionError::PlanNotFound { plan_id })?)
    }

    /// Send a lifecycle notification to the acting user's email on record.
    async fn notify_actor(&self, actor: &Actor, subject: &str, body: String) {
        match self.store.find_user(actor.id).await {
            Ok(Some(user)) => self.notifier.notify(&user.email, subject, &body).await,
            Ok(None) => {
                tracing::warn!(user_id = actor.id, "notification skipped: user not found")
            }
            Err(e) => {
                tracing::warn!(user_id = actor.id, error = %e, "notification skipped")
            }
        }
    }
}

#[derive(Clone, Copy)]
enum PlanChange {
    Upgrade,
    Downgrade,
}

impl PlanChange {
    fn check_prices(self, current_cents: i64, new_cents: i64) -> Result<()> {
        match self {
            Self::Upgrade if new_cents <= current_cents => {
                Err(SubscriptionError::PriceNotHigher {
                    current_cents,
                    new_cents,
                }
                .into())
            }
            Self::Downgrade if new_cents >= current_cents => {
                Err(SubscriptionError::PriceNotLower {
                    current_cents,
                    new_cents,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn subject(self) -> &'static str {
        match self {
            Self::Upgrade => "Subscription Upgraded",
            Self::Downgrade => "Subscription Downgraded",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Self::Upgrade => "upgraded",
            Self::Downgrade => "downgraded",
        }
    }
}

fn require_user_role(actor: &Actor) -> Result<()> {
    if actor.role != Role::User {
        return Err(SubscriptionError::RoleNotAllowed {
            required: Role::User,
        }
        .into());
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn cycle_end(start: NaiveDate) -> NaiveDate {
    start + Days::new(BILLING_CYCLE_DAYS)
}
