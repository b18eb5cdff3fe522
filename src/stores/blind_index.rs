//! Blind index store
//!
//! Lets encrypted user fields (email, first name, last name) be searched
//! by exact value without storing the value. Each row maps a source
//! reference (typically a user id) to the SHA-256 of the normalized value.
//! One store instance exists per indexed field.

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BlindIndexStoreOptions {
    pub table_name: String,
}

pub struct BlindIndexStore {
    db: Database,
    table: String,
}

/// Lowercased, trimmed form that is hashed
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn blind_hash(value: &str) -> String {
    hex::encode(Sha256::digest(normalize(value).as_bytes()))
}

impl BlindIndexStore {
    pub fn new(db: Database, options: BlindIndexStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            table: validate_table_name(&options.table_name)?,
        })
    }

    /// Index `value` for `source_reference`, replacing any previous value
    pub async fn upsert(&self, source_reference: &str, value: &str) -> Result<(), StoreError> {
        require_non_empty("source_reference", source_reference)?;
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, source_reference, search_value, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (source_reference) DO UPDATE \
                     SET search_value = excluded.search_value, updated_at = excluded.updated_at",
                    self.table
                ),
                &[
                    new_id().into(),
                    source_reference.into(),
                    blind_hash(value).into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Source references whose indexed value equals `value`
    pub async fn search(&self, value: &str) -> Result<Vec<String>, StoreError> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT source_reference FROM {} WHERE search_value = $1 ORDER BY source_reference",
                    self.table
                ),
                &[blind_hash(value).into()],
            )
            .await?;
        Ok(rows.iter().map(|row| row.string("source_reference")).collect())
    }

    /// Returns whether an entry was removed
    pub async fn remove(&self, source_reference: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE source_reference = $1", self.table),
                &[source_reference.into()],
            )
            .await?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl Store for BlindIndexStore {
    fn name(&self) -> &'static str {
        "blind_index"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     source_reference TEXT NOT NULL UNIQUE, \
                     search_value TEXT NOT NULL, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_search ON {t} (search_value)"),
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

    async fn store() -> BlindIndexStore {
        let store = BlindIndexStore::new(
            memory_db().await,
            BlindIndexStoreOptions {
                table_name: "test_bindx_email".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_matches_normalized_value() {
        let store = store().await;
        store.upsert("user-1", "Alice@Example.com").await.unwrap();
        store.upsert("user-2", "bob@example.com").await.unwrap();

        assert_eq!(store.search("  alice@example.COM ").await.unwrap(), vec!["user-1"]);
        assert!(store.search("carol@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let store = store().await;
        store.upsert("user-1", "old@example.com").await.unwrap();
        store.upsert("user-1", "new@example.com").await.unwrap();

        assert!(store.search("old@example.com").await.unwrap().is_empty());
        assert_eq!(store.search("new@example.com").await.unwrap(), vec!["user-1"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store().await;
        store.upsert("user-1", "a@example.com").await.unwrap();
        assert!(store.remove("user-1").await.unwrap());
        assert!(!store.remove("user-1").await.unwrap());
    }

    #[test]
    fn test_value_is_not_stored_in_clear() {
        let hashed = blind_hash("a@example.com");
        assert_eq!(hashed.len(), 64);
        assert!(!hashed.contains("example"));
        assert_eq!(hashed, blind_hash(" A@EXAMPLE.COM"));
    }
}
