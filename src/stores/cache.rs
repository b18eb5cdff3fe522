//! Database-backed key/value cache
//!
//! Survives restarts and is shared between processes, unlike
//! [`crate::cache::MemoryCache`]. An `expires_at` of zero never expires.

use super::{expires_after, new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheStoreOptions {
    pub cache_table_name: String,
}

pub struct CacheStore {
    db: Database,
    cache_table: String,
}

impl CacheStore {
    pub fn new(db: Database, options: CacheStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            cache_table: validate_table_name(&options.cache_table_name)?,
        })
    }

    /// Store `value` under `key`; `None` keeps it until removed
    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        require_non_empty("key", key)?;
        let now = now_millis();
        let expires_at = ttl.map_or(0, |ttl| expires_after(now, ttl));

        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, cache_key, cache_value, expires_at, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT (cache_key) DO UPDATE SET cache_value = excluded.cache_value, \
                     expires_at = excluded.expires_at, updated_at = excluded.updated_at",
                    self.cache_table
                ),
                &[
                    new_id().into(),
                    key.into(),
                    value.into(),
                    expires_at.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Value under `key` unless absent or expired
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT cache_value FROM {} \
                     WHERE cache_key = $1 AND (expires_at = 0 OR expires_at > $2)",
                    self.cache_table
                ),
                &[key.into(), now_millis().into()],
            )
            .await?;
        Ok(row.map(|row| row.string("cache_value")))
    }

    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE cache_key = $1", self.cache_table),
                &[key.into()],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Delete every expired entry, returning how many went
    pub async fn expire(&self) -> Result<u64, StoreError> {
        Ok(self
            .db
            .execute(
                &format!(
                    "DELETE FROM {} WHERE expires_at <> 0 AND expires_at <= $1",
                    self.cache_table
                ),
                &[now_millis().into()],
            )
            .await?)
    }
}

#[async_trait]
impl Store for CacheStore {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.cache_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.cache_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     cache_key TEXT NOT NULL UNIQUE, \
                     cache_value TEXT NOT NULL, \
                     expires_at BIGINT NOT NULL DEFAULT 0, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_expires ON {t} (expires_at)"),
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

    async fn store() -> CacheStore {
        let store = CacheStore::new(
            memory_db().await,
            CacheStoreOptions {
                cache_table_name: "test_cache".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_set_get_overwrite_remove() {
        let store = store().await;
        store.set("greeting", "hello", None).await.unwrap();
        store.set("greeting", "hi", None).await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hi"));

        assert!(store.remove("greeting").await.unwrap());
        assert!(store.get("greeting").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_removes_only_stale_rows() {
        let store = store().await;
        store
            .set("flash", "x", Some(Duration::from_millis(5)))
            .await
            .unwrap();
        store.set("keep", "y", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store.get("flash").await.unwrap().is_none());
        assert_eq!(store.expire().await.unwrap(), 1);
        assert_eq!(store.get("keep").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_expire_immediately() {
        let store = store().await;
        store.set("big", "v", Some(Duration::MAX)).await.unwrap();

        assert_eq!(store.expire().await.unwrap(), 0);
        assert_eq!(store.get("big").await.unwrap().as_deref(), Some("v"));
    }
}
