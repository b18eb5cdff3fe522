//! Geographic reference data: countries, states and timezones
//!
//! Migration seeds a built-in set of countries and timezones. Seeding is
//! idempotent, so existing rows (including edited ones) are left alone.

use super::{now_millis, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GeoStoreOptions {
    pub country_table_name: String,
    pub state_table_name: String,
    pub timezone_table_name: String,
}

/// (ISO 3166-1 alpha-2, alpha-3, name, calling code)
const COUNTRIES: &[(&str, &str, &str, &str)] = &[
    ("AU", "AUS", "Australia", "61"),
    ("BG", "BGR", "Bulgaria", "359"),
    ("BR", "BRA", "Brazil", "55"),
    ("CA", "CAN", "Canada", "1"),
    ("DE", "DEU", "Germany", "49"),
    ("ES", "ESP", "Spain", "34"),
    ("FR", "FRA", "France", "33"),
    ("GB", "GBR", "United Kingdom", "44"),
    ("IN", "IND", "India", "91"),
    ("IT", "ITA", "Italy", "39"),
    ("JP", "JPN", "Japan", "81"),
    ("NL", "NLD", "Netherlands", "31"),
    ("US", "USA", "United States", "1"),
];

/// (IANA name, country alpha-2)
const TIMEZONES: &[(&str, &str)] = &[
    ("Australia/Sydney", "AU"),
    ("Europe/Sofia", "BG"),
    ("America/Sao_Paulo", "BR"),
    ("America/Toronto", "CA"),
    ("Europe/Berlin", "DE"),
    ("Europe/Madrid", "ES"),
    ("Europe/Paris", "FR"),
    ("Europe/London", "GB"),
    ("Asia/Kolkata", "IN"),
    ("Europe/Rome", "IT"),
    ("Asia/Tokyo", "JP"),
    ("Europe/Amsterdam", "NL"),
    ("America/New_York", "US"),
    ("America/Los_Angeles", "US"),
    ("UTC", ""),
];

pub struct GeoStore {
    db: Database,
    country_table: String,
    state_table: String,
    timezone_table: String,
}

impl GeoStore {
    pub fn new(db: Database, options: GeoStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            country_table: validate_table_name(&options.country_table_name)?,
            state_table: validate_table_name(&options.state_table_name)?,
            timezone_table: validate_table_name(&options.timezone_table_name)?,
        })
    }

    pub async fn country_count(&self) -> Result<i64, StoreError> {
        Ok(self
            .db
            .query_count(&format!("SELECT COUNT(*) FROM {}", self.country_table), &[])
            .await?)
    }

    /// Country name for an alpha-2 code
    pub async fn country_name(&self, iso2: &str) -> Result<Option<String>, StoreError> {
        let row = self
            .db
            .query_one(
                &format!("SELECT name FROM {} WHERE iso2 = $1", self.country_table),
                &[iso2.to_ascii_uppercase().into()],
            )
            .await?;
        Ok(row.map(|row| row.string("name")))
    }

    async fn seed(&self) -> Result<(), StoreError> {
        let now = now_millis();
        for (iso2, iso3, name, calling_code) in COUNTRIES {
            self.db
                .execute(
                    &format!(
                        "INSERT INTO {} (iso2, iso3, name, calling_code, created_at) \
                         VALUES ($1, $2, $3, $4, $5) ON CONFLICT (iso2) DO NOTHING",
                        self.country_table
                    ),
                    &[(*iso2).into(), (*iso3).into(), (*name).into(), (*calling_code).into(), now.into()],
                )
                .await?;
        }
        for (name, country) in TIMEZONES {
            self.db
                .execute(
                    &format!(
                        "INSERT INTO {} (name, country_iso2, created_at) \
                         VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
                        self.timezone_table
                    ),
                    &[(*name).into(), (*country).into(), now.into()],
                )
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for GeoStore {
    fn name(&self) -> &'static str {
        "geo"
    }

    fn table_names(&self) -> Vec<String> {
        vec![
            self.country_table.clone(),
            self.state_table.clone(),
            self.timezone_table.clone(),
        ]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        run_migrations(
            &self.db,
            &[
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     iso2 TEXT PRIMARY KEY, \
                     iso3 TEXT NOT NULL, \
                     name TEXT NOT NULL, \
                     calling_code TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL)",
                    self.country_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     id TEXT PRIMARY KEY, \
                     country_iso2 TEXT NOT NULL, \
                     code TEXT NOT NULL, \
                     name TEXT NOT NULL, \
                     created_at BIGINT NOT NULL)",
                    self.state_table
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     name TEXT PRIMARY KEY, \
                     country_iso2 TEXT NOT NULL DEFAULT '', \
                     created_at BIGINT NOT NULL)",
                    self.timezone_table
                ),
            ],
        )
        .await?;
        self.seed().await
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
    async fn test_seed_is_idempotent() {
        let store = GeoStore::new(
            memory_db().await,
            GeoStoreOptions {
                country_table_name: "t_country".into(),
                state_table_name: "t_state".into(),
                timezone_table_name: "t_timezone".into(),
            },
        )
        .unwrap();

        store.auto_migrate().await.unwrap();
        let first = store.country_count().await.unwrap();
        store.auto_migrate().await.unwrap();

        assert_eq!(first, COUNTRIES.len() as i64);
        assert_eq!(store.country_count().await.unwrap(), first);
        assert_eq!(store.country_name("bg").await.unwrap().as_deref(), Some("Bulgaria"));
        assert!(store.country_name("XX").await.unwrap().is_none());
    }
}
