//! Audit trail store

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AuditStoreOptions {
    pub record_table_name: String,
}

/// A single audited action
#[derive(Debug, Clone, Default)]
pub struct AuditRecord {
    pub entity: String,
    pub action: String,
    pub actor: String,
    /// Free-form detail, usually JSON
    pub details: String,
}

pub struct AuditStore {
    db: Database,
    record_table: String,
}

impl AuditStore {
    pub fn new(db: Database, options: AuditStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            record_table: validate_table_name(&options.record_table_name)?,
        })
    }

    /// Append a record and return its id
    pub async fn record(&self, record: &AuditRecord) -> Result<String, StoreError> {
        require_non_empty("entity", &record.entity)?;
        require_non_empty("action", &record.action)?;

        let id = new_id();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, entity, action, actor, details, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                    self.record_table
                ),
                &[
                    id.as_str().into(),
                    record.entity.as_str().into(),
                    record.action.as_str().into(),
                    record.actor.as_str().into(),
                    record.details.as_str().into(),
                    now_millis().into(),
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.record_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for AuditStore {
    fn name(&self) -> &'static str {
        "audit"
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
                     entity TEXT NOT NULL, \
                     action TEXT NOT NULL, \
                     actor TEXT NOT NULL DEFAULT '', \
                     details TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_entity ON {t} (entity)"),
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
    async fn test_record_and_count() {
        let db = memory_db().await;
        let store = AuditStore::new(
            db.clone(),
            AuditStoreOptions {
                record_table_name: "test_audit".into(),
            },
        )
        .unwrap();
        assert!(!db.table_exists("test_audit").await.unwrap());

        store.auto_migrate().await.unwrap();
        store.auto_migrate().await.unwrap();

        let record = AuditRecord {
            entity: "user".into(),
            action: "login".into(),
            actor: "u1".into(),
            details: r#"{"ip":"127.0.0.1"}"#.into(),
        };
        store.record(&record).await.unwrap();
        store.record(&record).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_requires_entity_and_action() {
        let store = AuditStore::new(
            memory_db().await,
            AuditStoreOptions {
                record_table_name: "test_audit".into(),
            },
        )
        .unwrap();

        let err = store.record(&AuditRecord::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
