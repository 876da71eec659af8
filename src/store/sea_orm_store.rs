//! SeaORM-backed store.
//!
//! Production persistence for users, plans, and subscriptions. The schema
//! can be bootstrapped at startup with [`SeaOrmStore::migrate`], which emits
//! `CREATE TABLE IF NOT EXISTS` statements including the foreign keys from
//! subscriptions to users and plans.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Schema, Set,
    sea_query::Expr,
};

use super::{
    NewPlan, NewSubscription, NewUser, PlanRecord, PlanSubscriptionCount, Role, Store,
    SubscriptionFilter, SubscriptionRecord, SubscriptionStatus, SubscriptionUpdate, UserRecord,
};
use crate::error::{PlanholdError, Result};

// =============================================================================
// Entities
// =============================================================================

mod entity {
    pub mod user {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "users")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub name: String,
            #[sea_orm(unique)]
            pub email: String,
            pub password_hash: String,
            pub role: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(has_many = "super::subscription::Entity")]
            Subscription,
        }

        impl Related<super::subscription::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Subscription.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod plan {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "plans")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub name: String,
            pub description: Option<String>,
            pub quota: i32,
            pub price_cents: i64,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(has_many = "super::subscription::Entity")]
            Subscription,
        }

        impl Related<super::subscription::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Subscription.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod subscription {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "subscriptions")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub user_id: i64,
            pub plan_id: i64,
            pub start_date: Date,
            pub end_date: Date,
            pub status: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(
                belongs_to = "super::user::Entity",
                from = "Column::UserId",
                to = "super::user::Column::Id"
            )]
            User,
            #[sea_orm(
                belongs_to = "super::plan::Entity",
                from = "Column::PlanId",
                to = "super::plan::Column::Id"
            )]
            Plan,
        }

        impl Related<super::user::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::User.def()
            }
        }

        impl Related<super::plan::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Plan.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::{plan, subscription, user};

// =============================================================================
// Converters
// =============================================================================

fn model_to_user(model: user::Model) -> UserRecord {
    UserRecord {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        role: Role::parse(&model.role),
    }
}

fn model_to_plan(model: plan::Model) -> PlanRecord {
    PlanRecord {
        id: model.id,
        name: model.name,
        description: model.description,
        quota: u32::try_from(model.quota).unwrap_or(0),
        price_cents: model.price_cents,
    }
}

fn model_to_subscription(model: subscription::Model) -> SubscriptionRecord {
    SubscriptionRecord {
        id: model.id,
        user_id: model.user_id,
        plan_id: model.plan_id,
        start_date: model.start_date,
        end_date: model.end_date,
        status: SubscriptionStatus::parse(&model.status),
    }
}

// =============================================================================
// SeaOrmStore
// =============================================================================

/// SeaORM-backed [`Store`] implementation.
#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wrap an existing database connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let db = Database::connect(url)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;
        Ok(Self { db })
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        let builder = self.db.get_database_backend();
        let schema = Schema::new(builder);

        let mut statements = vec![
            schema.create_table_from_entity(user::Entity),
            schema.create_table_from_entity(plan::Entity),
            schema.create_table_from_entity(subscription::Entity),
        ];
        for stmt in &mut statements {
            stmt.if_not_exists();
            self.db
                .execute(builder.build(&*stmt))
                .await
                .map_err(|e| PlanholdError::Store(e.to_string()))?;
        }

        tracing::info!("database schema ready");
        Ok(())
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>> {
        tracing::debug!(user_id = id, "fetching user");

        let found = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(found.map(model_to_user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        tracing::debug!(email = %email, "fetching user by email");

        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(found.map(model_to_user))
    }

    async fn insert_user(&self, new: NewUser) -> Result<UserRecord> {
        tracing::debug!(email = %new.email, role = %new.role, "inserting user");

        // Pre-check for a friendly error; the unique index still backstops
        // concurrent registrations.
        if self.find_user_by_email(&new.email).await?.is_some() {
            return Err(PlanholdError::validation("Email already registered"));
        }

        let model = user::ActiveModel {
            name: Set(new.name),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            role: Set(new.role.as_str().to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(model_to_user(model))
    }

    // -------------------------------------------------------------------------
    // Plans
    // -------------------------------------------------------------------------

    async fn find_plan(&self, id: i64) -> Result<Option<PlanRecord>> {
        tracing::debug!(plan_id = id, "fetching plan");

        let found = plan::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(found.map(model_to_plan))
    }

    async fn list_plans(&self) -> Result<Vec<PlanRecord>> {
        tracing::debug!("listing plans");

        let plans = plan::Entity::find()
            .order_by_asc(plan::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(plans.into_iter().map(model_to_plan).collect())
    }

    async fn insert_plan(&self, new: NewPlan) -> Result<PlanRecord> {
        tracing::debug!(name = %new.name, price_cents = new.price_cents, "inserting plan");

        let model = plan::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            quota: Set(i32::try_from(new.quota).unwrap_or(i32::MAX)),
            price_cents: Set(new.price_cents),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(model_to_plan(model))
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    async fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>> {
        tracing::debug!(subscription_id = id, "fetching subscription");

        let found = subscription::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(found.map(model_to_subscription))
    }

    async fn insert_subscription(&self, new: NewSubscription) -> Result<SubscriptionRecord> {
        tracing::debug!(
            user_id = new.user_id,
            plan_id = new.plan_id,
            status = %new.status,
            "inserting subscription"
        );

        let model = subscription::ActiveModel {
            user_id: Set(new.user_id),
            plan_id: Set(new.plan_id),
            start_date: Set(new.start_date),
            end_date: Set(new.end_date),
            status: Set(new.status.as_str().to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(model_to_subscription(model))
    }

    async fn update_subscription(&self, id: i64, update: SubscriptionUpdate) -> Result<()> {
        tracing::debug!(subscription_id = id, "updating subscription");

        let mut query = subscription::Entity::update_many();
        if let Some(plan_id) = update.plan_id {
            query = query.col_expr(subscription::Column::PlanId, Expr::value(plan_id));
        }
        if let Some(start_date) = update.start_date {
            query = query.col_expr(subscription::Column::StartDate, Expr::value(start_date));
        }
        if let Some(end_date) = update.end_date {
            query = query.col_expr(subscription::Column::EndDate, Expr::value(end_date));
        }
        if let Some(status) = update.status {
            query = query.col_expr(subscription::Column::Status, Expr::value(status.as_str()));
        }

        let result = query
            .filter(subscription::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(PlanholdError::not_found(format!("Subscription {}", id)));
        }
        Ok(())
    }

    async fn list_subscriptions(
        &self,
        filter: SubscriptionFilter,
    ) -> Result<Vec<SubscriptionRecord>> {
        tracing::debug!(user_id = ?filter.user_id, "listing subscriptions");

        let mut query = subscription::Entity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(subscription::Column::UserId.eq(user_id));
        }

        let subs = query
            .order_by_asc(subscription::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        Ok(subs.into_iter().map(model_to_subscription).collect())
    }

    async fn count_subscriptions_by_plan(&self) -> Result<Vec<PlanSubscriptionCount>> {
        tracing::debug!("counting subscriptions per plan");

        let counts: Vec<(i64, i64)> = subscription::Entity::find()
            .select_only()
            .column(subscription::Column::PlanId)
            .column_as(subscription::Column::Id.count(), "subscriptions")
            .group_by(subscription::Column::PlanId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| PlanholdError::Store(e.to_string()))?;

        let plans = self.list_plans().await?;
        let mut ranked: Vec<_> = counts
            .into_iter()
            .filter_map(|(plan_id, count)| {
                plans
                    .iter()
                    .find(|p| p.id == plan_id)
                    .map(|plan| PlanSubscriptionCount {
                        plan_id,
                        plan_name: plan.name.clone(),
                        subscriptions: u64::try_from(count).unwrap_or(0),
                    })
            })
            .collect();
        ranked.sort_by(|a, b| b.subscriptions.cmp(&a.subscriptions));
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_to_user_parses_role() {
        let model = user::Model {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: "admin".to_string(),
        };
        let record = model_to_user(model);
        assert_eq!(record.role, Role::Admin);
    }

    #[test]
    fn test_model_to_plan_clamps_quota() {
        let model = plan::Model {
            id: 1,
            name: "Basic".to_string(),
            description: None,
            quota: -5,
            price_cents: 1000,
        };
        let record = model_to_plan(model);
        assert_eq!(record.quota, 0);
    }

    #[test]
    fn test_model_to_subscription_parses_status() {
        let model = subscription::Model {
            id: 1,
            user_id: 2,
            plan_id: 3,
            start_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            status: "renewed".to_string(),
        };
        let record = model_to_subscription(model);
        assert_eq!(record.status, SubscriptionStatus::Renewed);
    }
}
