//! Subscription plans and subscriber records

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SubscriptionStoreOptions {
    pub plan_table_name: String,
    pub subscription_table_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewPlan {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    /// month or year
    pub interval: String,
    /// Price id at the payment provider, when billed through Stripe
    pub provider_price_id: String,
}

pub struct SubscriptionStore {
    db: Database,
    plan_table: String,
    subscription_table: String,
}

impl SubscriptionStore {
    pub fn new(db: Database, options: SubscriptionStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            plan_table: validate_table_name(&options.plan_table_name)?,
            subscription_table: validate_table_name(&options.subscription_table_name)?,
        })
    }

    pub async fn create_plan(&self, plan: &NewPlan) -> Result<String, StoreError> {
        require_non_empty("title", &plan.title)?;
        let interval = match plan.interval.trim().to_ascii_lowercase().as_str() {
            "" | "month" => "month",
            "year" => "year",
            other => {
                return Err(StoreError::InvalidInput(format!(
                    "unknown billing interval '{other}'"
                )))
            }
        };

        let id = new_id();
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, title, description, price_cents, billing_interval, provider_price_id, status, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8)",
                    self.plan_table
                ),
                &[
                    id.as_str().into(),
                    plan.title.as_str().into(),
                    plan.description.as_str().into(),
                    plan.price_cents.into(),
                    interval.into(),
                    plan.provider_price_id.as_str().into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn plan_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.plan_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for SubscriptionStore {
    fn name(&self) -> &'static str {
        "subscription"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.plan_table.clone(), self.subscription_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let s = &self.subscription_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     title TEXT NOT NULL, \
                     description TEXT NOT NULL DEFAULT '', \
                     price_cents BIGINT NOT NULL DEFAULT 0, \
                     billing_interval TEXT NOT NULL, \
                     provider_price_id TEXT NOT NULL DEFAULT '', \
                     status TEXT NOT NULL, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)",
                    self.plan_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {s} (\
                     id TEXT PRIMARY KEY, \
                     plan_id TEXT NOT NULL, \
                     subscriber_id TEXT NOT NULL, \
                     status TEXT NOT NULL, \
                     period_start BIGINT NOT NULL DEFAULT 0, \
                     period_end BIGINT NOT NULL DEFAULT 0, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{s}_subscriber ON {s} (subscriber_id)"),
            ],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory_db;

    #[tokio::test]
    async fn test_create_plan_validates_interval() {
        let store = SubscriptionStore::new(
            memory_db().await,
            SubscriptionStoreOptions {
                plan_table_name: "t_plan".into(),
                subscription_table_name: "t_subscription".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        store
            .create_plan(&NewPlan {
                title: "Pro".into(),
                price_cents: 900,
                interval: "Year".into(),
                ..NewPlan::default()
            })
            .await
            .unwrap();
        let err = store
            .create_plan(&NewPlan {
                title: "Odd".into(),
                interval: "fortnight".into(),
                ..NewPlan::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert_eq!(store.plan_count().await.unwrap(), 1);
    }
}
