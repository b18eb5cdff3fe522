//! Optional persistence subsystems
//!
//! Every store owns one or more tables on the shared [`Database`]. Stores
//! are built in two steps:
//!
//! 1. Construction validates the table names and captures the handle. No
//!    SQL runs.
//! 2. [`Store::auto_migrate`] creates the tables and indexes. It is
//!    idempotent.
//!
//! The registry drives both steps for every enabled store. Statements use
//! portable column types (`TEXT`, `BIGINT`, `DOUBLE PRECISION`) and `$n`
//! placeholders, so the same SQL runs on SQLite and PostgreSQL.

pub mod audit;
pub mod blind_index;
pub mod blog;
pub mod cache;
pub mod chat;
pub mod cms;
pub mod custom;
pub mod entity;
pub mod feed;
pub mod geo;
pub mod log;
pub mod meta;
pub mod session;
pub mod setting;
pub mod shop;
pub mod sql_file;
pub mod stats;
pub mod subscription;
pub mod task;
pub mod user;
pub mod vault;

pub use audit::AuditStore;
pub use blind_index::BlindIndexStore;
pub use blog::BlogStore;
pub use cache::CacheStore;
pub use chat::ChatStore;
pub use cms::CmsStore;
pub use custom::CustomStore;
pub use entity::EntityStore;
pub use feed::FeedStore;
pub use geo::GeoStore;
pub use log::LogStore;
pub use meta::MetaStore;
pub use session::SessionStore;
pub use setting::SettingStore;
pub use shop::ShopStore;
pub use sql_file::SqlFileStore;
pub use stats::StatsStore;
pub use subscription::SubscriptionStore;
pub use task::TaskStore;
pub use user::UserStore;
pub use vault::VaultStore;

use crate::adapters::{Database, DatabaseError};
use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use std::any::Any;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Lifecycle surface shared by every store
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Tables this store owns, in creation order
    fn table_names(&self) -> Vec<String>;

    /// Create tables and indexes if they are missing
    async fn auto_migrate(&self) -> Result<(), StoreError>;

    /// Upcast for [`Arc::downcast`] back to the concrete store
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").ok())
        .as_ref()
}

/// Reject anything that is not a plain SQL identifier
///
/// Table names are interpolated into DDL and queries, so they are checked
/// once at construction time.
pub fn validate_table_name(name: &str) -> Result<String, StoreError> {
    if identifier_pattern().is_some_and(|re| re.is_match(name)) {
        Ok(name.to_string())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}

/// Run each statement in order
pub(crate) async fn run_migrations(db: &Database, statements: &[String]) -> Result<(), StoreError> {
    for statement in statements {
        db.execute_batch(statement).await?;
    }
    Ok(())
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Absolute expiry `ttl` after `now`, saturating at the far future
pub(crate) fn expires_after(now: i64, ttl: Duration) -> i64 {
    now.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        Err(StoreError::InvalidInput(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn memory_db() -> Database {
    Database::sqlite_memory().await.unwrap()
}
