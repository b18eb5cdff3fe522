//! File storage on top of SQL
//!
//! Stores small files by absolute path. The store owns its schema and
//! creates its table on first use, so the registry never migrates it.

use super::{new_id, now_millis, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, Clone)]
pub struct SqlFileStoreOptions {
    pub file_table_name: String,
}

pub struct SqlFileStore {
    db: Database,
    file_table: String,
    ready: OnceCell<()>,
}

/// Paths are absolute with no empty or relative segments
fn normalize_path(path: &str) -> Result<String, StoreError> {
    let trimmed = path.trim();
    if !trimmed.starts_with('/') {
        return Err(StoreError::InvalidInput(format!("path '{path}' must be absolute")));
    }
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(StoreError::InvalidInput(format!("path '{path}' must not contain . or ..")));
    }
    Ok(format!("/{}", segments.join("/")))
}

impl SqlFileStore {
    pub fn new(db: Database, options: SqlFileStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            file_table: validate_table_name(&options.file_table_name)?,
            ready: OnceCell::new(),
        })
    }

    async fn ensure_table(&self) -> Result<(), StoreError> {
        self.ready
            .get_or_try_init(|| async {
                let t = &self.file_table;
                run_migrations(
                    &self.db,
                    &[format!(
                        "CREATE TABLE IF NOT EXISTS {t} (\
                         id TEXT PRIMARY KEY, \
                         path TEXT NOT NULL UNIQUE, \
                         contents TEXT NOT NULL, \
                         size BIGINT NOT NULL, \
                         created_at BIGINT NOT NULL, \
                         updated_at BIGINT NOT NULL)"
                    )],
                )
                .await
            })
            .await?;
        Ok(())
    }

    /// Write `contents` at `path`, replacing any existing file
    pub async fn put(&self, path: &str, contents: &[u8]) -> Result<(), StoreError> {
        let path = normalize_path(path)?;
        self.ensure_table().await?;

        let now = now_millis();
        let size = i64::try_from(contents.len()).unwrap_or(i64::MAX);
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, path, contents, size, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT (path) DO UPDATE SET contents = excluded.contents, \
                     size = excluded.size, updated_at = excluded.updated_at",
                    self.file_table
                ),
                &[
                    new_id().into(),
                    path.into(),
                    STANDARD.encode(contents).into(),
                    size.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = normalize_path(path)?;
        self.ensure_table().await?;

        let row = self
            .db
            .query_one(
                &format!("SELECT contents FROM {} WHERE path = $1", self.file_table),
                &[path.into()],
            )
            .await?;
        row.map(|row| {
            STANDARD
                .decode(row.string("contents"))
                .map_err(|e| StoreError::InvalidInput(format!("stored file is corrupt: {e}")))
        })
        .transpose()
    }

    pub async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let path = normalize_path(path)?;
        self.ensure_table().await?;
        let count = self
            .db
            .query_count(
                &format!("SELECT COUNT(*) FROM {} WHERE path = $1", self.file_table),
                &[path.into()],
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        let path = normalize_path(path)?;
        self.ensure_table().await?;
        let affected = self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE path = $1", self.file_table),
                &[path.into()],
            )
            .await?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl Store for SqlFileStore {
    fn name(&self) -> &'static str {
        "sql_file_storage"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.file_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        self.ensure_table().await
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
    async fn test_table_created_on_first_use() {
        let db = memory_db().await;
        let store = SqlFileStore::new(
            db.clone(),
            SqlFileStoreOptions {
                file_table_name: "t_files".into(),
            },
        )
        .unwrap();
        assert!(!db.table_exists("t_files").await.unwrap());

        assert!(!store.exists("/a.txt").await.unwrap());
        assert!(db.table_exists("t_files").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = SqlFileStore::new(
            memory_db().await,
            SqlFileStoreOptions {
                file_table_name: "t_files".into(),
            },
        )
        .unwrap();

        store.put("/docs//readme.md", b"# hi").await.unwrap();
        assert!(store.exists("/docs/readme.md").await.unwrap());
        assert_eq!(store.get("/docs/readme.md").await.unwrap().unwrap(), b"# hi");

        store.put("/docs/readme.md", &[0, 159, 146, 150]).await.unwrap();
        assert_eq!(store.get("/docs/readme.md").await.unwrap().unwrap(), [0, 159, 146, 150]);

        assert!(store.delete("/docs/readme.md").await.unwrap());
        assert!(store.get("/docs/readme.md").await.unwrap().is_none());
    }

    #[test]
    fn test_relative_paths_rejected() {
        assert!(normalize_path("docs/a").is_err());
        assert!(normalize_path("/docs/../etc").is_err());
        assert_eq!(normalize_path("/a//b/").unwrap(), "/a/b");
    }
}
