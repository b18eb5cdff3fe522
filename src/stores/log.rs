//! Application log store
//!
//! Backs the database logger installed by the registry once migrations
//! succeed (see [`crate::logging::database`]).

use super::{new_id, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LogStoreOptions {
    pub log_table_name: String,
}

/// One persisted log line
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub id: String,
    pub level: String,
    pub message: String,
    /// JSON object of structured fields
    pub context: String,
    pub time: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, message: impl Into<String>, context: serde_json::Value) -> Self {
        Self {
            id: new_id(),
            level: level.into(),
            message: message.into(),
            context: context.to_string(),
            time: Utc::now(),
        }
    }
}

pub struct LogStore {
    db: Database,
    log_table: String,
}

impl LogStore {
    pub fn new(db: Database, options: LogStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            log_table: validate_table_name(&options.log_table_name)?,
        })
    }

    pub async fn insert(&self, record: &LogRecord) -> Result<(), StoreError> {
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, level, message, context, time) VALUES ($1, $2, $3, $4, $5)",
                    self.log_table
                ),
                &[
                    record.id.as_str().into(),
                    record.level.as_str().into(),
                    record.message.as_str().into(),
                    record.context.as_str().into(),
                    record.time.to_rfc3339_opts(SecondsFormat::Micros, true).into(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.log_table), &[])
            .await?)
    }

    /// Newest records first
    pub async fn recent(&self, limit: i64) -> Result<Vec<LogRecord>, StoreError> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT id, level, message, context, time FROM {} ORDER BY time DESC LIMIT $1",
                    self.log_table
                ),
                &[limit.max(0).into()],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| LogRecord {
                id: row.string("id"),
                level: row.string("level"),
                message: row.string("message"),
                context: row.string("context"),
                time: DateTime::parse_from_rfc3339(&row.string("time"))
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl Store for LogStore {
    fn name(&self) -> &'static str {
        "log"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.log_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.log_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     level TEXT NOT NULL, \
                     message TEXT NOT NULL, \
                     context TEXT NOT NULL DEFAULT '{{}}', \
                     time TEXT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_time ON {t} (time)"),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_level ON {t} (level)"),
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
    async fn test_insert_and_recent() {
        let store = LogStore::new(
            memory_db().await,
            LogStoreOptions {
                log_table_name: "t_log".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        let first = LogRecord::new("INFO", "booted", json!({"stores": 3}));
        let mut second = LogRecord::new("ERROR", "failed", json!({}));
        second.time = first.time + chrono::Duration::milliseconds(5);
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let recent = store.recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "failed");
        assert_eq!(recent[0].time.timestamp_micros(), second.time.timestamp_micros());

        let all = store.recent(10).await.unwrap();
        assert_eq!(all[1].context, r#"{"stores":3}"#);
    }
}
