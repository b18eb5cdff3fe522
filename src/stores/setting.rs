//! Global application settings

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SettingStoreOptions {
    pub setting_table_name: String,
}

pub struct SettingStore {
    db: Database,
    setting_table: String,
}

impl SettingStore {
    pub fn new(db: Database, options: SettingStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            setting_table: validate_table_name(&options.setting_table_name)?,
        })
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        require_non_empty("key", key)?;
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, setting_key, setting_value, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (setting_key) DO UPDATE \
                     SET setting_value = excluded.setting_value, updated_at = excluded.updated_at",
                    self.setting_table
                ),
                &[new_id().into(), key.into(), value.into(), now.into(), now.into()],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT setting_value FROM {} WHERE setting_key = $1",
                    self.setting_table
                ),
                &[key.into()],
            )
            .await?;
        Ok(row.map(|row| row.string("setting_value")))
    }

    /// Value for `key`, or `default` when unset
    pub async fn get_or(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.to_string()))
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE setting_key = $1", self.setting_table),
                &[key.into()],
            )
            .await?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl Store for SettingStore {
    fn name(&self) -> &'static str {
        "setting"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.setting_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        run_migrations(
            &self.db,
            &[format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id TEXT PRIMARY KEY, \
                 setting_key TEXT NOT NULL UNIQUE, \
                 setting_value TEXT NOT NULL DEFAULT '', \
                 created_at BIGINT NOT NULL, \
                 updated_at BIGINT NOT NULL)",
                self.setting_table
            )],
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
    async fn test_set_get_delete() {
        let store = SettingStore::new(
            memory_db().await,
            SettingStoreOptions {
                setting_table_name: "t_settings".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        assert_eq!(store.get_or("site.name", "Scaffold").await.unwrap(), "Scaffold");
        store.set("site.name", "Acme").await.unwrap();
        assert_eq!(store.get("site.name").await.unwrap().as_deref(), Some("Acme"));

        assert!(store.delete("site.name").await.unwrap());
        assert!(!store.delete("site.name").await.unwrap());
        assert!(store.get("site.name").await.unwrap().is_none());
    }
}
