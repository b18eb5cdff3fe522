//! Blog post store

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::{Database, Row};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BlogStoreOptions {
    pub post_table_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub author_id: String,
    /// draft, published or trash
    pub status: String,
    pub created_at: i64,
}

impl Post {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            summary: String::new(),
            content: content.into(),
            author_id: String::new(),
            status: "draft".to_string(),
            created_at: now_millis(),
        }
    }

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.string("id"),
            title: row.string("title"),
            summary: row.string("summary"),
            content: row.string("content"),
            author_id: row.string("author_id"),
            status: row.string("status"),
            created_at: row.get_i64("created_at").unwrap_or_default(),
        }
    }
}

pub struct BlogStore {
    db: Database,
    post_table: String,
}

impl BlogStore {
    pub fn new(db: Database, options: BlogStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            post_table: validate_table_name(&options.post_table_name)?,
        })
    }

    pub async fn create_post(&self, post: &Post) -> Result<(), StoreError> {
        require_non_empty("title", &post.title)?;
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, title, summary, content, author_id, status, created_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    self.post_table
                ),
                &[
                    post.id.as_str().into(),
                    post.title.as_str().into(),
                    post.summary.as_str().into(),
                    post.content.as_str().into(),
                    post.author_id.as_str().into(),
                    post.status.as_str().into(),
                    post.created_at.into(),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn find_post(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!(
                    "SELECT id, title, summary, content, author_id, status, created_at \
                     FROM {} WHERE id = $1",
                    self.post_table
                ),
                &[id.into()],
            )
            .await?;
        Ok(row.as_ref().map(Post::from_row))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.post_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for BlogStore {
    fn name(&self) -> &'static str {
        "blog"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.post_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let t = &self.post_table;
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {t} (\
                     id TEXT PRIMARY KEY, \
                     title TEXT NOT NULL, \
                     summary TEXT NOT NULL DEFAULT '', \
                     content TEXT NOT NULL DEFAULT '', \
                     author_id TEXT NOT NULL DEFAULT '', \
                     status TEXT NOT NULL, \
                     created_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{t}_status ON {t} (status)"),
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
    async fn test_create_and_find_post() {
        let store = BlogStore::new(
            memory_db().await,
            BlogStoreOptions {
                post_table_name: "test_blog_post".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        let mut post = Post::new("Hello", "First post");
        post.status = "published".into();
        store.create_post(&post).await.unwrap();

        assert_eq!(store.find_post(&post.id).await.unwrap(), Some(post));
        assert!(store.find_post("missing").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_untitled_post_rejected() {
        let store = BlogStore::new(
            memory_db().await,
            BlogStoreOptions {
                post_table_name: "test_blog_post".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        let err = store.create_post(&Post::new(" ", "body")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }
}
