//! Application registry
//!
//! The registry is the single composition root. It owns the configuration,
//! the database handle, both caches, both loggers and every enabled store,
//! and it enforces the boot sequence:
//!
//! 1. Caches (defaults when none were supplied)
//! 2. Console logger
//! 3. Database
//! 4. Store initialization (phase 1)
//! 5. Store migration (phase 2)
//! 6. Promotion of the database logger, when the log store is enabled
//!
//! # Example
//!
//! ```no_run
//! use webscaffold::config::load_config;
//! use webscaffold::registry::Registry;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Registry::new(load_config()?).await?;
//! if let Some(users) = registry.user_store() {
//!     println!("{} users", users.count().await?);
//! }
//! registry.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod initializers;
pub mod lifecycle;

pub use lifecycle::{StoreId, StoreLifecycle, LIFECYCLE};

use crate::adapters::{open_database, Database, DatabaseError};
use crate::cache::{CacheError, FileCache, MemoryCache};
use crate::config::Config;
use crate::logging::{console_dispatch, database_dispatch, ConsoleOptions, LoggingError};
use crate::stores::{
    AuditStore, BlindIndexStore, BlogStore, CacheStore, ChatStore, CmsStore, CustomStore,
    EntityStore, FeedStore, GeoStore, LogStore, MetaStore, SessionStore, SettingStore, ShopStore,
    SqlFileStore, StatsStore, Store, StoreError, SubscriptionStore, TaskStore, UserStore,
    VaultStore,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),

    #[error("logger setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("database open failed: {0}")]
    DatabaseOpen(#[source] DatabaseError),

    #[error("database close failed: {0}")]
    DatabaseClose(#[source] DatabaseError),

    #[error("store '{store}' failed to initialize: {source}")]
    StoreInitialize {
        store: StoreId,
        #[source]
        source: StoreError,
    },

    #[error("store '{store}' failed to migrate: {source}")]
    StoreMigrate {
        store: StoreId,
        #[source]
        source: StoreError,
    },

    #[error("store '{store}' is enabled but was never initialized")]
    StoreMissing { store: StoreId },
}

impl RegistryError {
    /// Store named by the error, if any
    pub fn store(&self) -> Option<StoreId> {
        match self {
            RegistryError::StoreInitialize { store, .. }
            | RegistryError::StoreMigrate { store, .. }
            | RegistryError::StoreMissing { store } => Some(*store),
            _ => None,
        }
    }
}

/// Builder for [`Registry`]
pub struct RegistryBuilder {
    config: Config,
    memory_cache: Option<Arc<MemoryCache>>,
    file_cache: Option<Arc<FileCache>>,
    console: Option<ConsoleOptions>,
}

impl RegistryBuilder {
    pub fn memory_cache(mut self, cache: Arc<MemoryCache>) -> Self {
        self.memory_cache = Some(cache);
        self
    }

    pub fn file_cache(mut self, cache: Arc<FileCache>) -> Self {
        self.file_cache = Some(cache);
        self
    }

    /// Console logger settings; defaults are derived from the config
    pub fn console(mut self, options: ConsoleOptions) -> Self {
        self.console = Some(options);
        self
    }

    /// Run the boot sequence
    ///
    /// # Errors
    ///
    /// Every failure is surfaced. When a store phase fails the database is
    /// closed before the error is returned.
    pub async fn build(self) -> Result<Registry, RegistryError> {
        let memory_cache = self
            .memory_cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));
        let file_cache = match self.file_cache {
            Some(cache) => cache,
            None => Arc::new(FileCache::discover()?),
        };

        let console_options = self
            .console
            .unwrap_or_else(|| ConsoleOptions::from_config(&self.config));
        let console = console_dispatch(&console_options)?;
        let level = LevelFilter::from_level(console_options.effective_level()?);

        let config = self.config;
        let boot_console = console.clone();
        async move {
            tracing::debug!(root = %file_cache.root().display(), "Caches ready");

            let database = open_database(&config.database)
                .await
                .map_err(RegistryError::DatabaseOpen)?;

            let registry = Registry {
                config: RwLock::new(Arc::new(config)),
                database: RwLock::new(Some(database.clone())),
                memory_cache: RwLock::new(memory_cache),
                file_cache: RwLock::new(file_cache),
                console: RwLock::new(console.clone()),
                logger: RwLock::new(console.clone()),
                database_logger: RwLock::new(None),
                stores: RwLock::new(HashMap::new()),
            };

            let booted = async {
                registry.initialize_stores()?;
                registry.migrate_stores().await
            }
            .await;
            if let Err(e) = booted {
                tracing::error!(error = %e, "Store boot failed");
                if let Err(close_err) = database.close().await {
                    tracing::warn!(error = %close_err, "Failed to close database after boot failure");
                }
                return Err(e);
            }

            if let Some(log_store) = registry.log_store() {
                registry.promote_logger(database_dispatch(log_store, console, level));
            }

            tracing::info!(
                stores = registry.stores.read().len(),
                driver = %database.driver(),
                "Registry ready"
            );
            Ok(registry)
        }
        .with_subscriber(boot_console)
        .await
    }
}

/// Composition root holding every shared service
pub struct Registry {
    config: RwLock<Arc<Config>>,
    database: RwLock<Option<Database>>,
    memory_cache: RwLock<Arc<MemoryCache>>,
    file_cache: RwLock<Arc<FileCache>>,
    console: RwLock<Dispatch>,
    logger: RwLock<Dispatch>,
    database_logger: RwLock<Option<Dispatch>>,
    stores: RwLock<HashMap<StoreId, Arc<dyn Store>>>,
}

impl Registry {
    pub fn builder(config: Config) -> RegistryBuilder {
        RegistryBuilder {
            config,
            memory_cache: None,
            file_cache: None,
            console: None,
        }
    }

    /// Boot a registry with default caches and console settings
    pub async fn new(config: Config) -> Result<Self, RegistryError> {
        Self::builder(config).build().await
    }

    /// Phase 1: construct every enabled store without running DDL
    pub fn initialize_stores(&self) -> Result<(), RegistryError> {
        let config = self.config();
        let database = self.database().ok_or(RegistryError::DatabaseOpen(DatabaseError::Closed))?;

        for entry in LIFECYCLE.iter() {
            if !(entry.enabled)(&config.stores) {
                continue;
            }
            let store = (entry.initialize)(database.clone(), &config).map_err(|source| {
                RegistryError::StoreInitialize {
                    store: entry.id,
                    source,
                }
            })?;
            tracing::debug!(store = %entry.id, tables = ?store.table_names(), "Store initialized");
            self.stores.write().insert(entry.id, store);
        }
        Ok(())
    }

    /// Phase 2: migrate every enabled store in boot order
    pub async fn migrate_stores(&self) -> Result<(), RegistryError> {
        let config = self.config();
        for entry in LIFECYCLE.iter() {
            if !(entry.enabled)(&config.stores) {
                continue;
            }
            let store = self
                .store(entry.id)
                .ok_or(RegistryError::StoreMissing { store: entry.id })?;
            (entry.migrate)(store.as_ref())
                .await
                .map_err(|source| RegistryError::StoreMigrate {
                    store: entry.id,
                    source,
                })?;
            tracing::debug!(store = %entry.id, "Store migrated");
        }
        Ok(())
    }

    /// Swap the active logger for the database logger
    fn promote_logger(&self, database_logger: Dispatch) {
        *self.database_logger.write() = Some(database_logger.clone());
        *self.logger.write() = database_logger;
        tracing::info!("Database logger active");
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: Config) {
        *self.config.write() = Arc::new(config);
    }

    pub fn database(&self) -> Option<Database> {
        self.database.read().clone()
    }

    pub fn set_database(&self, database: Option<Database>) {
        *self.database.write() = database;
    }

    pub fn memory_cache(&self) -> Arc<MemoryCache> {
        self.memory_cache.read().clone()
    }

    pub fn set_memory_cache(&self, cache: Arc<MemoryCache>) {
        *self.memory_cache.write() = cache;
    }

    pub fn file_cache(&self) -> Arc<FileCache> {
        self.file_cache.read().clone()
    }

    pub fn set_file_cache(&self, cache: Arc<FileCache>) {
        *self.file_cache.write() = cache;
    }

    /// Bootstrap logger writing to stdout
    pub fn console(&self) -> Dispatch {
        self.console.read().clone()
    }

    pub fn set_console(&self, console: Dispatch) {
        *self.console.write() = console;
    }

    /// Active logger: the database logger once promoted, else the console
    pub fn logger(&self) -> Dispatch {
        self.logger.read().clone()
    }

    pub fn set_logger(&self, logger: Dispatch) {
        *self.logger.write() = logger;
    }

    pub fn database_logger(&self) -> Option<Dispatch> {
        self.database_logger.read().clone()
    }

    pub fn set_database_logger(&self, logger: Option<Dispatch>) {
        *self.database_logger.write() = logger;
    }

    pub fn store(&self, id: StoreId) -> Option<Arc<dyn Store>> {
        self.stores.read().get(&id).cloned()
    }

    /// Replace or remove the store registered under `id`
    pub fn set_store(&self, id: StoreId, store: Option<Arc<dyn Store>>) {
        let mut stores = self.stores.write();
        match store {
            Some(store) => stores.insert(id, store),
            None => stores.remove(&id),
        };
    }

    /// The store under `id` as its concrete type
    pub fn store_as<T: Store>(&self, id: StoreId) -> Option<Arc<T>> {
        self.store(id)?.into_any().downcast::<T>().ok()
    }

    /// Ids of the stores currently held, in boot order
    pub fn store_ids(&self) -> Vec<StoreId> {
        let stores = self.stores.read();
        StoreId::ALL
            .into_iter()
            .filter(|id| stores.contains_key(id))
            .collect()
    }

    /// Close the database handle
    ///
    /// Safe to call repeatedly; calls after the first are no-ops.
    pub async fn close(&self) -> Result<(), RegistryError> {
        let database = self.database.write().take();
        if let Some(database) = database {
            database.close().await.map_err(RegistryError::DatabaseClose)?;
            tracing::info!("Database closed");
        }
        Ok(())
    }
}

macro_rules! typed_store_getters {
    ($($method:ident => $id:ident: $ty:ty),* $(,)?) => {
        impl Registry {
            $(
                pub fn $method(&self) -> Option<Arc<$ty>> {
                    self.store_as::<$ty>(StoreId::$id)
                }
            )*
        }
    };
}

typed_store_getters! {
    audit_store => Audit: AuditStore,
    blind_index_email_store => BlindIndexEmail: BlindIndexStore,
    blind_index_first_name_store => BlindIndexFirstName: BlindIndexStore,
    blind_index_last_name_store => BlindIndexLastName: BlindIndexStore,
    blog_store => Blog: BlogStore,
    cache_store => Cache: CacheStore,
    chat_store => Chat: ChatStore,
    cms_store => Cms: CmsStore,
    custom_store => Custom: CustomStore,
    entity_store => Entity: EntityStore,
    feed_store => Feed: FeedStore,
    geo_store => Geo: GeoStore,
    log_store => Log: LogStore,
    meta_store => Meta: MetaStore,
    session_store => Session: SessionStore,
    setting_store => Setting: SettingStore,
    shop_store => Shop: ShopStore,
    sql_file_store => SqlFile: SqlFileStore,
    stats_store => Stats: StatsStore,
    subscription_store => Subscription: SubscriptionStore,
    task_store => Task: TaskStore,
    user_store => User: UserStore,
    vault_store => Vault: VaultStore,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    fn sqlite_config() -> Config {
        let mut config = Config::default();
        config.database = DatabaseConfig {
            driver: "sqlite".into(),
            database: ":memory:".into(),
            ..DatabaseConfig::default()
        };
        config
    }

    async fn boot(config: Config, dir: &tempfile::TempDir) -> Registry {
        Registry::builder(config)
            .file_cache(Arc::new(FileCache::new(dir.path().join(".cache")).unwrap()))
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_no_stores_when_all_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let registry = boot(sqlite_config(), &dir).await;

        assert!(registry.store_ids().is_empty());
        assert!(registry.database().is_some());
        assert!(registry.database_logger().is_none());
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_typed_getter_downcasts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sqlite_config();
        config.stores.setting = true;
        let registry = boot(config, &dir).await;

        let settings = registry.setting_store().unwrap();
        settings.set("theme", "dark").await.unwrap();
        assert_eq!(settings.get("theme").await.unwrap().as_deref(), Some("dark"));
        assert!(registry.store_as::<UserStore>(StoreId::Setting).is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = boot(sqlite_config(), &dir).await;
        registry.close().await.unwrap();
        registry.close().await.unwrap();
        assert!(registry.database().is_none());
    }

    #[tokio::test]
    async fn test_set_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = boot(sqlite_config(), &dir).await;
        let db = registry.database().unwrap();

        let store = initializers::meta(db, &registry.config()).unwrap();
        registry.set_store(StoreId::Meta, Some(store));
        assert!(registry.meta_store().is_some());

        registry.set_store(StoreId::Meta, None);
        assert!(registry.meta_store().is_none());
    }

    #[tokio::test]
    async fn test_missing_store_fails_migration() {
        let dir = tempfile::tempdir().unwrap();
        let registry = boot(sqlite_config(), &dir).await;

        let mut config = (*registry.config()).clone();
        config.stores.blog = true;
        registry.set_config(config);

        let err = registry.migrate_stores().await.unwrap_err();
        assert_eq!(err.store(), Some(StoreId::Blog));
    }

    #[tokio::test]
    async fn test_unsupported_driver_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = sqlite_config();
        config.database.driver = "mysql".into();

        let result = Registry::builder(config)
            .file_cache(Arc::new(FileCache::new(dir.path()).unwrap()))
            .build()
            .await;
        assert!(matches!(result, Err(RegistryError::DatabaseOpen(_))));
    }
}
