//! Feed aggregation store: subscribed feeds and the links fetched from them

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FeedStoreOptions {
    pub feed_table_name: String,
    pub link_table_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedLink {
    pub id: String,
    pub feed_id: String,
    pub title: String,
    pub url: String,
}

pub struct FeedStore {
    db: Database,
    feed_table: String,
    link_table: String,
}

impl FeedStore {
    pub fn new(db: Database, options: FeedStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            feed_table: validate_table_name(&options.feed_table_name)?,
            link_table: validate_table_name(&options.link_table_name)?,
        })
    }

    pub async fn create_feed(&self, name: &str, url: &str) -> Result<String, StoreError> {
        require_non_empty("url", url)?;
        let id = new_id();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, name, url, created_at) VALUES ($1, $2, $3, $4)",
                    self.feed_table
                ),
                &[id.as_str().into(), name.into(), url.into(), now_millis().into()],
            )
            .await?;
        Ok(id)
    }

    /// Record a link; a URL already stored for the feed is ignored
    ///
    /// Returns whether a new row was written.
    pub async fn add_link(&self, feed_id: &str, title: &str, url: &str) -> Result<bool, StoreError> {
        require_non_empty("url", url)?;
        let affected = self
            .db
            .execute(
                &format!(
                    "INSERT INTO {} (id, feed_id, title, url, created_at) VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (feed_id, url) DO NOTHING",
                    self.link_table
                ),
                &[new_id().into(), feed_id.into(), title.into(), url.into(), now_millis().into()],
            )
            .await?;
        Ok(affected > 0)
    }

    pub async fn links(&self, feed_id: &str) -> Result<Vec<FeedLink>, StoreError> {
        let rows = self
            .db
            .query(
                &format!(
                    "SELECT id, feed_id, title, url FROM {} WHERE feed_id = $1 ORDER BY created_at, url",
                    self.link_table
                ),
                &[feed_id.into()],
            )
            .await?;
        Ok(rows
            .iter()
            .map(|row| FeedLink {
                id: row.string("id"),
                feed_id: row.string("feed_id"),
                title: row.string("title"),
                url: row.string("url"),
            })
            .collect())
    }
}

#[async_trait]
impl Store for FeedStore {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.feed_table.clone(), self.link_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     name TEXT NOT NULL DEFAULT '', \
                     url TEXT NOT NULL, \
                     created_at BIGINT NOT NULL)",
                    self.feed_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     feed_id TEXT NOT NULL, \
                     title TEXT NOT NULL DEFAULT '', \
                     url TEXT NOT NULL, \
                     created_at BIGINT NOT NULL, \
                     UNIQUE (feed_id, url))",
                    self.link_table
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

    #[tokio::test]
    async fn test_links_are_deduplicated_per_feed() {
        let store = FeedStore::new(
            memory_db().await,
            FeedStoreOptions {
                feed_table_name: "t_feed".into(),
                link_table_name: "t_link".into(),
            },
        )
        .unwrap();
        store.auto_migrate().await.unwrap();

        let feed = store.create_feed("Rust", "https://blog.rust-lang.org/feed.xml").await.unwrap();
        assert!(store.add_link(&feed, "1.0", "https://blog.rust-lang.org/1.0").await.unwrap());
        assert!(!store.add_link(&feed, "1.0 again", "https://blog.rust-lang.org/1.0").await.unwrap());
        assert!(store.add_link(&feed, "2024", "https://blog.rust-lang.org/2024").await.unwrap());

        let links = store.links(&feed).await.unwrap();
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l.feed_id == feed));
    }
}
