//! Schemaless record store keyed by a caller-defined type

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CustomStoreOptions {
    pub record_table_name: String,
}

pub struct CustomStore {
    db: Database,
    record_table: String,
}

impl CustomStore {
    pub fn new(db: Database, options: CustomStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            record_table: validate_table_name(&options.record_table_name)?,
        })
    }

    /// Persist a JSON payload under `record_type` and return the new id
    pub async fn create(
        &self,
        record_type: &str,
        payload: &serde_json::Value,
    ) -> Result<String, StoreError> {
        require_non_empty("record_type", record_type)?;
        let id = new_id();
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, record_type, payload, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5)",
                    self.record_table
                ),
                &[
                    id.as_str().into(),
                    record_type.into(),
                    serde_json::to_string(payload)?.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn count_by_type(&self, record_type: &str) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE record_type = $1",
                    self.record_table
                ),
                &[record_type.into()],
            )
            .await?)
    }
}

#[async_trait]
impl Store for CustomStore {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.record_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.record_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     record_type TEXT NOT NULL, \
                     payload TEXT NOT NULL DEFAULT '{{}}', \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_type ON {t} (record_type)"),
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
    use serde_json::json;

    #[tokio::test]
    async fn test_count_by_type() {
        let store = CustomStore::new(
            memory_db().await,
            CustomStoreOptions {
                record_table_name: "test_custom".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        store.create("invoice", &json!({"total": 10})).await.unwrap();
        store.create("invoice", &json!({"total": 20})).await.unwrap();
        store.create("note", &json!("hello")).await.unwrap();

        assert_eq!(store.count_by_type("invoice").await.unwrap(), 2);
        assert_eq!(store.count_by_type("note").await.unwrap(), 1);
        assert_eq!(store.count_by_type("other").await.unwrap(), 0);
    }
}
