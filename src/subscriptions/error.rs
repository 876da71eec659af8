//! Lifecycle-specific error types.
//!
//! Granular variants carry the ids and prices involved; conversion into
//! [`PlanholdError`] decides the HTTP-facing classification.

use crate::error::PlanholdError;
use crate::store::Role;

/// Errors raised by subscription lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Plan not found: {plan_id}")]
    PlanNotFound { plan_id: i64 },

    #[error("Subscription not found: {subscription_id}")]
    SubscriptionNotFound { subscription_id: i64 },

    #[error("Subscription {subscription_id} does not belong to you")]
    NotOwner { subscription_id: i64 },

    #[error("This action requires the {required} role")]
    RoleNotAllowed { required: Role },

    #[error("New plan must be higher priced for upgrade ({new_cents} <= {current_cents})")]
    PriceNotHigher { current_cents: i64, new_cents: i64 },

    #[error("New plan must be lower priced for downgrade ({new_cents} >= {current_cents})")]
    PriceNotLower { current_cents: i64, new_cents: i64 },
}

impl From<SubscriptionError> for PlanholdError {
    fn from(err: SubscriptionError) -> Self {
        match &err {
            SubscriptionError::PlanNotFound { .. }
            | SubscriptionError::SubscriptionNotFound { .. } => {
                PlanholdError::NotFound(err.to_string())
            }

            SubscriptionError::NotOwner { .. } | SubscriptionError::RoleNotAllowed { .. } => {
                PlanholdError::Forbidden(err.to_string())
            }

            SubscriptionError::PriceNotHigher { .. } | SubscriptionError::PriceNotLower { .. } => {
                PlanholdError::InvalidTransition(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SubscriptionError::PlanNotFound { plan_id: 9 };
        assert_eq!(err.to_string(), "Plan not found: 9");

        let err = SubscriptionError::PriceNotHigher {
            current_cents: 2000,
            new_cents: 1000,
        };
        assert!(err.to_string().contains("higher priced"));
    }

    #[test]
    fn test_conversion_classification() {
        let err: PlanholdError = SubscriptionError::SubscriptionNotFound { subscription_id: 1 }.into();
        assert!(matches!(err, PlanholdError::NotFound(_)));

        let err: PlanholdError = SubscriptionError::NotOwner { subscription_id: 1 }.into();
        assert!(matches!(err, PlanholdError::Forbidden(_)));

        let err: PlanholdError = SubscriptionError::RoleNotAllowed {
            required: Role::User,
        }
        .into();
        assert!(matches!(err, PlanholdError::Forbidden(_)));

        let err: PlanholdError = SubscriptionError::PriceNotLower {
            current_cents: 1000,
            new_cents: 2000,
        }
        .into();
        assert!(matches!(err, PlanholdError::InvalidTransition(_)));
    }
}
