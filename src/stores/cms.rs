//! Content management store
//!
//! Sites own pages, templates, blocks and menus. Pages created without an
//! explicit template fall back to the configured default template id.

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CmsStoreOptions {
    pub block_table_name: String,
    pub page_table_name: String,
    pub template_table_name: String,
    pub site_table_name: String,
    pub menu_table_name: String,
    pub menu_item_table_name: String,
    pub translation_table_name: String,
    pub version_table_name: String,
    pub default_template_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewPage {
    pub site_id: String,
    pub title: String,
    pub alias: String,
    pub content: String,
    /// Blank selects the default template
    pub template_id: String,
}

pub struct CmsStore {
    db: Database,
    block_table: String,
    page_table: String,
    template_table: String,
    site_table: String,
    menu_table: String,
    menu_item_table: String,
    translation_table: String,
    version_table: String,
    default_template_id: String,
}

/// Columns shared by every site-scoped content table
fn content_table(name: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {name} (\
         id TEXT PRIMARY KEY, \
         site_id TEXT NOT NULL DEFAULT '', \
         name TEXT NOT NULL DEFAULT '', \
         content TEXT NOT NULL DEFAULT '', \
         status TEXT NOT NULL DEFAULT 'draft', \
         created_at BIGINT NOT NULL, \
         updated_at BIGINT NOT NULL)"
    )
}

impl CmsStore {
    pub fn new(db: Database, options: CmsStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            block_table: validate_table_name(&options.block_table_name)?,
            page_table: validate_table_name(&options.page_table_name)?,
            template_table: validate_table_name(&options.template_table_name)?,
            site_table: validate_table_name(&options.site_table_name)?,
            menu_table: validate_table_name(&options.menu_table_name)?,
            menu_item_table: validate_table_name(&options.menu_item_table_name)?,
            translation_table: validate_table_name(&options.translation_table_name)?,
            version_table: validate_table_name(&options.version_table_name)?,
            default_template_id: options.default_template_id,
        })
    }

    pub fn default_template_id(&self) -> &str {
        &self.default_template_id
    }

    /// Create a page and record its first version
    pub async fn create_page(&self, page: &NewPage) -> Result<String, StoreError> {
        require_non_empty("title", &page.title)?;
        let template_id = if page.template_id.trim().is_empty() {
            self.default_template_id.as_str()
        } else {
            page.template_id.as_str()
        };

        let id = new_id();
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, site_id, title, alias, content, template_id, status, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, $8)",
                    self.page_table
                ),
                &[
                    id.as_str().into(),
                    page.site_id.as_str().into(),
                    page.title.as_str().into(),
                    page.alias.as_str().into(),
                    page.content.as_str().into(),
                    template_id.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;

        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, entity_type, entity_id, content, created_at) \
                     VALUES ($1, 'page', $2, $3, $4)",
                    self.version_table
                ),
                &[new_id().into(), id.as_str().into(), page.content.as_str().into(), now.into()],
            )
            .await?;
        Ok(id)
    }

    pub async fn page_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.page_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for CmsStore {
    fn name(&self) -> &'static str {
        "cms"
    }

    fn table_names(&self) -> Vec<String> {
        vec![
            self.block_table.clone(),
            self.page_table.clone(),
            self.template_table.clone(),
            self.site_table.clone(),
            self.menu_table.clone(),
            self.menu_item_table.clone(),
            self.translation_table.clone(),
            self.version_table.clone(),
        ]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let page = &self.page_table;
        let item = &self.menu_item_table;
        let translation = &self.translation_table;
        let version = &self.version_table;
        run_migrations(
            &self.db,
            &[
                content_table(&self.block_table),
                format!(
                    "CREATE TABLE IF NOT EXISTS {page} (\
                     id TEXT PRIMARY KEY, \
                     site_id TEXT NOT NULL DEFAULT '', \
                     title TEXT NOT NULL, \
                     alias TEXT NOT NULL DEFAULT '', \
                     content TEXT NOT NULL DEFAULT '', \
                     template_id TEXT NOT NULL DEFAULT '', \
                     status TEXT NOT NULL, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!("CREATE INDEX IF NOT EXISTS idx_{page}_alias ON {page} (site_id, alias)"),
                content_table(&self.template_table),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     name TEXT NOT NULL, \
                     domain_names TEXT NOT NULL DEFAULT '', \
                     status TEXT NOT NULL DEFAULT 'draft', \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)",
                    self.site_table
                ),
                content_table(&self.menu_table),
                format!(
                    "CREATE TABLE IF NOT EXISTS {item} (\
                     id TEXT PRIMARY KEY, \
                     menu_id TEXT NOT NULL, \
                     parent_id TEXT NOT NULL DEFAULT '', \
                     page_id TEXT NOT NULL DEFAULT '', \
                     name TEXT NOT NULL DEFAULT '', \
                     url TEXT NOT NULL DEFAULT '', \
                     sequence BIGINT NOT NULL DEFAULT 0, \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {translation} (\
                     id TEXT PRIMARY KEY, \
                     site_id TEXT NOT NULL DEFAULT '', \
                     handle TEXT NOT NULL, \
                     language TEXT NOT NULL, \
                     content TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL, \
                     updated_at BIGINT NOT NULL)"
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {version} (\
                     id TEXT PRIMARY KEY, \
                     entity_type TEXT NOT NULL, \
                     entity_id TEXT NOT NULL, \
                     content TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL)"
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS idx_{version}_entity ON {version} (entity_type, entity_id)"
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

    fn options() -> CmsStoreOptions {
        CmsStoreOptions {
            block_table_name: "t_block".into(),
            page_table_name: "t_page".into(),
            template_table_name: "t_template".into(),
            site_table_name: "t_site".into(),
            menu_table_name: "t_menu".into(),
            menu_item_table_name: "t_menu_item".into(),
            translation_table_name: "t_translation".into(),
            version_table_name: "t_version".into(),
            default_template_id: "tpl-default".into(),
        }
    }

    #[tokio::test]
    async fn test_migrate_creates_every_table() {
        let db = memory_db().await;
        let store = CmsStore::new(db.clone(), options()).unwrap();
        store.auto_migrate().await.unwrap();

        for table in store.table_names() {
            assert!(db.table_exists(&table).await.unwrap(), "{table} missing");
        }
    }

    #[tokio::test]
    async fn test_page_uses_default_template() {
        let db = memory_db().await;
        let store = CmsStore::new(db.clone(), options()).unwrap();
        store.auto_migrate().await.unwrap();

        let id = store
            .create_page(&NewPage {
                title: "Home".into(),
                alias: "/".into(),
                ..NewPage::default()
            })
            .await
            .unwrap();
        assert_eq!(store.page_count().await.unwrap(), 1);

        let row = db
            .query_one("SELECT template_id FROM t_page WHERE id = $1", &[id.into()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get_str("template_id"), Some("tpl-default"));
        assert_eq!(db.query_count("SELECT COUNT(*) FROM t_version", &[]).await.unwrap(), 1);
    }
}
