//! Plan management.
//!
//! Plans are created by administrators and browsed by every authenticated
//! user. Plans are never deleted.

use std::sync::Arc;

use crate::auth::Actor;
use crate::error::{PlanholdError, Result};
use crate::store::{NewPlan, PlanRecord, Store};

/// Plan catalog operations.
pub struct PlanCatalog {
    store: Arc<dyn Store>,
}

impl PlanCatalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a plan. Admin only.
    pub async fn create(&self, actor: &Actor, new: NewPlan) -> Result<PlanRecord> {
        if !actor.is_admin() {
            return Err(PlanholdError::forbidden("Admins only"));
        }

        if new.name.trim().is_empty() {
            return Err(PlanholdError::validation("Plan name is required"));
        }
        if new.price_cents < 0 {
            return Err(PlanholdError::validation("Plan price must be non-negative"));
        }

        let plan = self
            .store
            .insert_plan(NewPlan {
                name: new.name.trim().to_string(),
                ..new
            })
            .await?;

        tracing::info!(plan_id = plan.id, name = %plan.name, "plan created");
        Ok(plan)
    }

    /// List every plan.
    pub async fn list(&self) -> Result<Vec<PlanRecord>> {
        self.store.list_plans().await
    }

    /// Fetch one plan.
    pub async fn get(&self, plan_id: i64) -> Result<PlanRecord> {
        self.store
            .find_plan(plan_id)
            .await?
            .ok_or_else(|| PlanholdError::not_found(format!("Plan {}", plan_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, Role};

    fn admin() -> Actor {
        Actor {
            id: 1,
            name: "Root".to_string(),
            role: Role::Admin,
        }
    }

    fn user() -> Actor {
        Actor {
            id: 2,
            name: "Ada".to_string(),
            role: Role::User,
        }
    }

    fn new_plan(name: &str, price_cents: i64) -> NewPlan {
        NewPlan {
            name: name.to_string(),
            description: Some("A plan".to_string()),
            quota: 50,
            price_cents,
        }
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let catalog = PlanCatalog::new(Arc::new(InMemoryStore::new()));

        let err = catalog
            .create(&user(), new_plan("Basic", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanholdError::Forbidden(_)));

        let plan = catalog
            .create(&admin(), new_plan("Basic", 1000))
            .await
            .unwrap();
        assert_eq!(plan.name, "Basic");
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let catalog = PlanCatalog::new(Arc::new(InMemoryStore::new()));

        let err = catalog
            .create(&admin(), new_plan("   ", 1000))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanholdError::Validation(_)));

        let err = catalog
            .create(&admin(), new_plan("Basic", -5))
            .await
            .unwrap_err();
        assert!(matches!(err, PlanholdError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let catalog = PlanCatalog::new(Arc::new(InMemoryStore::new()));
        let created = catalog
            .create(&admin(), new_plan("Basic", 1000))
            .await
            .unwrap();

        let plans = catalog.list().await.unwrap();
        assert_eq!(plans.len(), 1);

        let plan = catalog.get(created.id).await.unwrap();
        assert_eq!(plan.id, created.id);

        let err = catalog.get(999).await.unwrap_err();
        assert!(matches!(err, PlanholdError::NotFound(_)));
    }
}
