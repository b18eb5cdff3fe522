//! Metadata attached to arbitrary objects

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MetaStoreOptions {
    pub meta_table_name: String,
}

pub struct MetaStore {
    db: Database,
    meta_table: String,
}

impl MetaStore {
    pub fn new(db: Database, options: MetaStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            meta_table: validate_table_name(&options.meta_table_name)?,
        })
    }

    /// Set `key` on the object identified by `(object_type, object_id)`
    pub async fn set(
        &self,
        object_type: &str,
        object_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        require_non_empty("object_type", object_type)?;
        require_non_empty("key", key)?;
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, object_type, object_id, meta_key, meta_value, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     ON CONFLICT (object_type, object_id, meta_key) DO UPDATE \
                     SET meta_value = excluded.meta_value, updated_at = excluded.updated_at",
                    self.meta_table
                ),
                &[
                    new_id().into(),
                    object_type.into(),
                    object_id.into(),
                    key.into(),
                    value.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(
        &self,
        object_type: &str,
        object_id: &str,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT meta_value FROM {} \
                     WHERE object_type = $1 AND object_id = $2 AND meta_key = $3",
                    self.meta_table
                ),
                &[object_type.into(), object_id.into(), key.into()],
            )
            .await?;
        Ok(row.map(|row| row.string("meta_value")))
    }
}

#[async_trait]
impl Store for MetaStore {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.meta_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        run_migrations(
            &self.db,
            &[format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id TEXT PRIMARY KEY, \
                 object_type TEXT NOT NULL, \
                 object_id TEXT NOT NULL, \
                 meta_key TEXT NOT NULL, \
                 meta_value TEXT NOT NULL DEFAULT '', \
                 created_at BIGINT NOT NULL, \
                 updated_at BIGINT NOT NULL, \
                 UNIQUE (object_type, object_id, meta_key))",
                self.meta_table
            )],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
