//! Server-side session store
//!
//! Sessions are keyed by an opaque token and always carry an expiry.

use super::{expires_after, new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionStoreOptions {
    pub session_table_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub key: String,
    pub user_id: String,
    pub value: String,
    pub expires_at: i64,
}

pub struct SessionStore {
    db: Database,
    session_table: String,
}

impl SessionStore {
    pub fn new(db: Database, options: SessionStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            session_table: validate_table_name(&options.session_table_name)?,
        })
    }

    /// Create or refresh the session under `key`
    pub async fn put(
        &self,
        key: &str,
        user_id: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        require_non_empty("key", key)?;
        let now = now_millis();
        let expires_at = expires_after(now, ttl);
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, session_key, user_id, session_value, expires_at, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     ON CONFLICT (session_key) DO UPDATE SET user_id = excluded.user_id, \
                     session_value = excluded.session_value, expires_at = excluded.expires_at, \
                     updated_at = excluded.updated_at",
                    self.session_table
                ),
                &[
                    new_id().into(),
                    key.into(),
                    user_id.into(),
                    value.into(),
                    expires_at.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Live session under `key`
    pub async fn get(&self, key: &str) -> Result<Option<Session>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT session_key, user_id, session_value, expires_at FROM {} \
                     WHERE session_key = $1 AND expires_at > $2",
                    self.session_table
                ),
                &[key.into(), now_millis().into()],
            )
            .await?;
        Ok(row.map(|row| Session {
            key: row.string("session_key"),
            user_id: row.string("user_id"),
            value: row.string("session_value"),
            expires_at: row.get_i64("expires_at").unwrap_or_default(),
        }))
    }

    pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE session_key = $1", self.session_table),
                &[key.into()],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Delete expired sessions, returning how many went
    pub async fn expire(&self) -> Result<u64, StoreError> {
        Ok(self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE expires_at <= $1", self.session_table),
                &[now_millis().into()],
            )
            .await?)
    }
}

#[async_trait]
impl Store for SessionStore {
    fn name(&self) -> &'static str {
        "session"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.session_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.session_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     session_key TEXT NOT NULL UNIQUE, \
                     user_id TEXT NOT NULL DEFAULT '', \
                     session_value TEXT NOT NULL DEFAULT '', \
                     expires_at BIGINT NOT NULL, \
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
