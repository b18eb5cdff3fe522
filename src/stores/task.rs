//! Background task definitions, queue and schedules
//!
//! Queue items move from `queued` to `running` and finally to `success`
//! or `failed`. Finished items are pruned periodically by the background
//! loop in [`crate::core::background`].

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TaskStoreOptions {
    pub task_definition_table_name: String,
    pub task_queue_table_name: String,
    pub schedule_table_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Queued,
    Running,
    Success,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Queued => "queued",
            QueueStatus::Running => "running",
            QueueStatus::Success => "success",
            QueueStatus::Failed => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, QueueStatus::Success | QueueStatus::Failed)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct TaskStore {
    db: Database,
    definition_table: String,
    queue_table: String,
    schedule_table: String,
}

impl TaskStore {
    pub fn new(db: Database, options: TaskStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            definition_table: validate_table_name(&options.task_definition_table_name)?,
            queue_table: validate_table_name(&options.task_queue_table_name)?,
            schedule_table: validate_table_name(&options.schedule_table_name)?,
        })
    }

    /// Register or update the task known by `alias`
    pub async fn define(&self, alias: &str, title: &str, description: &str) -> Result<(), StoreError> {
        require_non_empty("alias", alias)?;
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, alias, title, description, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT (alias) DO UPDATE SET title = excluded.title, \
                     description = excluded.description, updated_at = excluded.updated_at",
                    self.definition_table
                ),
                &[new_id().into(), alias.into(), title.into(), description.into(), now.into(), now.into()],
            )
            .await?;
        Ok(())
    }

    /// Queue a run of a defined task and return the queue item id
    pub async fn enqueue(&self, alias: &str, parameters: &serde_json::Value) -> Result<String, StoreError> {
        let definition = self
            .db
            .query_one(
                &format!("SELECT id FROM {} WHERE alias = $1", self.definition_table),
                &[alias.into()],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("task definition '{alias}'")))?;

        let id = new_id();
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, task_id, status, parameters, output, started_at, completed_at, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, '', 0, 0, $5, $6)",
                    self.queue_table
                ),
                &[
                    id.as_str().into(),
                    definition.string("id").into(),
                    QueueStatus::Queued.as_str().into(),
                    serde_json::to_string(parameters)?.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(id)
    }

    /// Record the outcome of a queue item
    pub async fn finish(&self, queue_id: &str, status: QueueStatus, output: &str) -> Result<(), StoreError> {
        if !status.is_finished() {
            return Err(StoreError::InvalidInput(format!(
                "'{status}' is not a finished status"
            )));
        }
        let now = now_millis();
        let affected = self
            .db
            .execute(
                &format!(
                    "UPDATE {} SET status = $1, output = $2, completed_at = $3, updated_at = $4 WHERE id = $5",
                    self.queue_table
                ),
                &[status.as_str().into(), output.into(), now.into(), now.into(), queue_id.into()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("queue item {queue_id}")));
        }
        Ok(())
    }

    pub async fn queued_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(
                &format!("SELECT COUNT(*) FROM {} WHERE status = $1", self.queue_table),
                &[QueueStatus::Queued.as_str().into()],
            )
            .await?)
    }

    /// Delete finished queue items completed before `cutoff_millis`
    pub async fn clear_finished_before(&self, cutoff_millis: i64) -> Result<u64, StoreError> {
        Ok(self
            .db
            .execute(
                &format!(
                    "DELETE FROM {} WHERE status IN ($1, $2) AND completed_at < $3",
                    self.queue_table
                ),
                &[
                    QueueStatus::Success.as_str().into(),
                    QueueStatus::Failed.as_str().into(),
                    cutoff_millis.into(),
                ],
            )
            .await?)
    }
}

#[async_trait]
impl Store for TaskStore {
    fn name(&self) -> &'static str {
        "task"
    }

    fn table_names(&self) -> Vec<String> {
        vec![
            self.definition_table.clone(),
            self.queue_table.clone(),
            self.schedule_table.clone(),
        ]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let q = &self.queue_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     alias TEXT NOT NULL UNIQUE, \
                     title TEXT NOT NULL DEFAULT '', \
                     description TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)",
                    self.definition_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {q} (\
                     id TEXT PRIMARY KEY, \
                     task_id TEXT NOT NULL, \
                     status TEXT NOT NULL, \
                     parameters TEXT NOT NULL DEFAULT '{{}}', \
                     output TEXT NOT NULL DEFAULT '', \
                     started_at BIGINT NOT NULL DEFAULT 0, \
                     completed_at BIGINT NOT NULL DEFAULT 0, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{q}_status ON {q} (status, completed_at)"),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     task_id TEXT NOT NULL, \
                     cron TEXT NOT NULL, \
                     parameters TEXT NOT NULL DEFAULT '{{}}', \
                     next_run_at BIGINT NOT NULL DEFAULT 0, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)",
                    self.schedule_table
                ),
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

    async fn store() -> TaskStore {
        let store = TaskStore::new(
            memory_db().await,
            TaskStoreOptions {
                task_definition_table_name: "t_task_definition".into(),
                task_queue_table_name: "t_task_queue".into(),
                schedule_table_name: "t_schedule".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_enqueue_requires_definition() {
        let store = store().await;
        let err = store.enqueue("send-mail", &json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.define("send-mail", "Send mail", "").await.unwrap();
        store.define("send-mail", "Send mail", "updated").await.unwrap();
        store.enqueue("send-mail", &json!({"to": "a@b.c"})).await.unwrap();
        assert_eq!(store.queued_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_finished_before_keeps_pending_items() {
        let store = store().await;
        store.define("cleanup", "Cleanup", "").await.unwrap();
        let done = store.enqueue("cleanup", &json!({})).await.unwrap();
        let failed = store.enqueue("cleanup", &json!({})).await.unwrap();
        store.enqueue("cleanup", &json!({})).await.unwrap();

        store.finish(&done, QueueStatus::Success, "ok").await.unwrap();
        store.finish(&failed, QueueStatus::Failed, "boom").await.unwrap();
        assert!(store.finish(&done, QueueStatus::Running, "").await.is_err());

        assert_eq!(store.clear_finished_before(0).await.unwrap(), 0);
        assert_eq!(store.clear_finished_before(now_millis() + 1).await.unwrap(), 2);
        assert_eq!(store.queued_count().await.unwrap(), 1);
    }
}
