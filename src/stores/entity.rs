//! Entity-attribute-value store with a trash bin
//!
//! Trashing an entity moves it and its attributes into the trash tables
//! instead of deleting them.

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EntityStoreOptions {
    pub entity_table_name: String,
    pub entity_trash_table_name: String,
    pub attribute_table_name: String,
    pub attribute_trash_table_name: String,
}

pub struct EntityStore {
    db: Database,
    entity_table: String,
    entity_trash_table: String,
    attribute_table: String,
    attribute_trash_table: String,
}

impl EntityStore {
    pub fn new(db: Database, options: EntityStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            entity_table: validate_table_name(&options.entity_table_name)?,
            entity_trash_table: validate_table_name(&options.entity_trash_table_name)?,
            attribute_table: validate_table_name(&options.attribute_table_name)?,
            attribute_trash_table: validate_table_name(&options.attribute_trash_table_name)?,
        })
    }

    pub async fn create_entity(&self, entity_type: &str) -> Result<String, StoreError> {
        require_non_empty("entity_type", entity_type)?;
        let id = new_id();
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, entity_type, created_at, updated_at) VALUES ($1, $2, $3, $4)",
                    self.entity_table
                ),
                &[id.as_str().into(), entity_type.into(), now.into(), now.into()],
            )
            .await?;
        Ok(id)
    }

    /// Set or replace one attribute of a live entity
    pub async fn set_attribute(&self, entity_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        require_non_empty("attribute key", key)?;
        let exists = self
            .db
            .query_count(
                &format!("SELECT COUNT(*) FROM {} WHERE id = $1", self.entity_table),
                &[entity_id.into()],
            )
            .await?;
        if exists == 0 {
            return Err(StoreError::NotFound(format!("entity {entity_id}")));
        }

        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, entity_id, attribute_key, attribute_value, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT (entity_id, attribute_key) DO UPDATE \
                     SET attribute_value = excluded.attribute_value, updated_at = excluded.updated_at",
                    self.attribute_table
                ),
                &[
                    new_id().into(),
                    entity_id.into(),
                    key.into(),
                    value.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn attribute(&self, entity_id: &str, key: &str) -> Result<Option<String>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT attribute_value FROM {} WHERE entity_id = $1 AND attribute_key = $2",
                    self.attribute_table
                ),
                &[entity_id.into(), key.into()],
            )
            .await?;
        Ok(row.map(|row| row.string("attribute_value")))
    }

    /// Move an entity and its attributes to the trash tables
    ///
    /// Returns `false` when the entity does not exist.
    pub async fn trash_entity(&self, entity_id: &str, deleted_by: &str) -> Result<bool, StoreError> {
        let now = now_millis();
        let moved = self
            .db
            .execute(
                &format!(
                    "INSERT INTO {} (id, entity_type, created_at, updated_at, deleted_at, deleted_by) \
                     SELECT id, entity_type, created_at, updated_at, CAST($1 AS BIGINT), CAST($2 AS TEXT) FROM {} WHERE id = $3",
                    self.entity_trash_table, self.entity_table
                ),
                &[now.into(), deleted_by.into(), entity_id.into()],
            )
            .await?;
        if moved == 0 {
            return Ok(false);
        }

        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, entity_id, attribute_key, attribute_value, created_at, updated_at, deleted_at, deleted_by) \
                     SELECT id, entity_id, attribute_key, attribute_value, created_at, updated_at, CAST($1 AS BIGINT), CAST($2 AS TEXT) \
                     FROM {} WHERE entity_id = $3",
                    self.attribute_trash_table, self.attribute_table
                ),
                &[now.into(), deleted_by.into(), entity_id.into()],
            )
            .await?;
        self.db
            .execute(
                &format!("DELETE FROM {} WHERE entity_id = $1", self.attribute_table),
                &[entity_id.into()],
            )
            .await?;
        self.db
            .execute(
                &format!("DELETE FROM {} WHERE id = $1", self.entity_table),
                &[entity_id.into()],
            )
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl Store for EntityStore {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn table_names(&self) -> Vec<String> {
        vec![
            self.entity_table.clone(),
            self.entity_trash_table.clone(),
            self.attribute_table.clone(),
            self.attribute_trash_table.clone(),
        ]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let entity_columns = "id TEXT PRIMARY KEY, \
                              entity_type TEXT NOT NULL, \
                              created_at BIGINT NOT NULL, \
                              updated_at BIGINT NOT NULL";
        let attribute_columns = "id TEXT PRIMARY KEY, \
                                 entity_id TEXT NOT NULL, \
                                 attribute_key TEXT NOT NULL, \
                                 attribute_value TEXT NOT NULL DEFAULT '', \
                                 created_at BIGINT NOT NULL, \
                                 updated_at BIGINT NOT NULL";
        let trash_columns = "deleted_at BIGINT NOT NULL, deleted_by TEXT NOT NULL DEFAULT ''";

        run_migrations(
            &self.db,
            &[
                format!("CREATE TABLE IF NOT EXISTS {} ({entity_columns})", self.entity_table),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} ({entity_columns}, {trash_columns})",
                    self.entity_trash_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} ({attribute_columns}, UNIQUE (entity_id, attribute_key))",
                    self.attribute_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} ({attribute_columns}, {trash_columns})",
                    self.attribute_trash_table
                ),
            ],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
