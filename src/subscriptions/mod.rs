//! Subscription lifecycle.
//!
//! Owns the rules for creating, upgrading, downgrading, cancelling, and
//! renewing subscriptions, and for authorizing who may perform each action.

mod error;
mod lifecycle;

pub use error::SubscriptionError;
pub use lifecycle::{BILLING_CYCLE_DAYS, SubscriptionLifecycle};
