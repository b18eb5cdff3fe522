//! Visitor statistics

use super::{new_id, now_millis, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StatsStoreOptions {
    pub visitor_table_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Visit {
    pub path: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    pub country: String,
}

pub struct StatsStore {
    db: Database,
    visitor_table: String,
}

impl StatsStore {
    pub fn new(db: Database, options: StatsStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            visitor_table: validate_table_name(&options.visitor_table_name)?,
        })
    }

    pub async fn record_visit(&self, visit: &Visit) -> Result<String, StoreError> {
        let id = new_id();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, path, ip_address, user_agent, referrer, country, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    self.visitor_table
                ),
                &[
                    id.as_str().into(),
                    visit.path.as_str().into(),
                    visit.ip_address.as_str().into(),
                    visit.user_agent.as_str().into(),
                    visit.referrer.as_str().into(),
                    visit.country.as_str().into(),
                    now_millis().into(),
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn visitor_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.visitor_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for StatsStore {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.visitor_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.visitor_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     path TEXT NOT NULL DEFAULT '', \
                     ip_address TEXT NOT NULL DEFAULT '', \
                     user_agent TEXT NOT NULL DEFAULT '', \
                     referrer TEXT NOT NULL DEFAULT '', \
                     country TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_created ON {t} (created_at)"),
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
    async fn test_record_visits() {
        let store = StatsStore::new(
            memory_db().await,
            StatsStoreOptions {
                visitor_table_name: "t_visitor".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        for path in ["/", "/blog", "/"] {
            store
                .record_visit(&Visit {
                    path: path.into(),
                    ip_address: "10.0.0.1".into(),
                    ..Visit::default()
                })
                .await
                .unwrap();
        }
        assert_eq!(store.visitor_count().await.unwrap(), 3);
    }
}
