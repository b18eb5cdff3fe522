//! Shop store: catalogue, discounts, media and orders

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ShopStoreOptions {
    pub category_table_name: String,
    pub discount_table_name: String,
    pub media_table_name: String,
    pub order_table_name: String,
    pub order_line_item_table_name: String,
    pub product_table_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    /// Minor currency units
    pub price_cents: i64,
    pub quantity: i64,
}

pub struct ShopStore {
    db: Database,
    category_table: String,
    discount_table: String,
    media_table: String,
    order_table: String,
    order_line_item_table: String,
    product_table: String,
}

impl ShopStore {
    pub fn new(db: Database, options: ShopStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            category_table: validate_table_name(&options.category_table_name)?,
            discount_table: validate_table_name(&options.discount_table_name)?,
            media_table: validate_table_name(&options.media_table_name)?,
            order_table: validate_table_name(&options.order_table_name)?,
            order_line_item_table: validate_table_name(&options.order_line_item_table_name)?,
            product_table: validate_table_name(&options.product_table_name)?,
        })
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<String, StoreError> {
        require_non_empty("title", &product.title)?;
        if product.price_cents < 0 || product.quantity < 0 {
            return Err(StoreError::InvalidInput(
                "price and quantity must not be negative".to_string(),
            ));
        }

        let id = new_id();
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, title, description, price_cents, quantity, status, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5, 'draft', $6, $7)",
                    self.product_table
                ),
                &[
                    id.as_str().into(),
                    product.title.as_str().into(),
                    product.description.as_str().into(),
                    product.price_cents.into(),
                    product.quantity.into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await?;
        Ok(id)
    }

    pub async fn product_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.product_table), &[])
            .await?)
    }
}

#[async_trait]
impl Store for ShopStore {
    fn name(&self) -> &'static str {
        "shop"
    }

    fn table_names(&self) -> Vec<String> {
        vec![
            self.category_table.clone(),
            self.discount_table.clone(),
            self.media_table.clone(),
            self.order_table.clone(),
            self.order_line_item_table.clone(),
            self.product_table.clone(),
        ]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        let stamps = "created_at BIGINT NOT NULL DEFAULT 0, updated_at BIGINT NOT NULL DEFAULT 0";
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, parent_id TEXT NOT NULL DEFAULT '', \
                     title TEXT NOT NULL, status TEXT NOT NULL DEFAULT 'draft', {stamps})",
                    self.category_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, code TEXT NOT NULL UNIQUE, \
                     discount_type TEXT NOT NULL DEFAULT 'percent', amount DOUBLE PRECISION NOT NULL DEFAULT 0, \
                     starts_at BIGINT NOT NULL DEFAULT 0, ends_at BIGINT NOT NULL DEFAULT 0, {stamps})",
                    self.discount_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, entity_id TEXT NOT NULL, media_type TEXT NOT NULL DEFAULT '', \
                     url TEXT NOT NULL, sequence BIGINT NOT NULL DEFAULT 0, {stamps})",
                    self.media_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, customer_id TEXT NOT NULL, status TEXT NOT NULL DEFAULT 'pending', \
                     total_cents BIGINT NOT NULL DEFAULT 0, {stamps})",
                    self.order_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, order_id TEXT NOT NULL, product_id TEXT NOT NULL, \
                     quantity BIGINT NOT NULL DEFAULT 1, price_cents BIGINT NOT NULL DEFAULT 0, {stamps})",
                    self.order_line_item_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, title TEXT NOT NULL, description TEXT NOT NULL DEFAULT '', \
                     price_cents BIGINT NOT NULL DEFAULT 0, quantity BIGINT NOT NULL DEFAULT 0, \
                     status TEXT NOT NULL DEFAULT 'draft', {stamps})",
                    self.product_table
                ),
            ],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
