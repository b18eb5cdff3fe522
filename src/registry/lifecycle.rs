//! Table-driven store lifecycle
//!
//! [`LIFECYCLE`] lists every store in boot order together with its
//! enablement predicate, initializer and migrator. Both registry phases walk
//! this table front to back.

use super::initializers;
use crate::adapters::Database;
use crate::config::{Config, StoresConfig};
use crate::stores::{Store, StoreError};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Identifier of an optional store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreId {
    Audit,
    BlindIndexEmail,
    BlindIndexFirstName,
    BlindIndexLastName,
    Blog,
    Cache,
    Chat,
    Cms,
    Custom,
    Entity,
    Feed,
    Geo,
    Log,
    Meta,
    Session,
    Setting,
    Shop,
    SqlFile,
    Stats,
    Subscription,
    Task,
    User,
    Vault,
}

impl StoreId {
    /// Every store in initialization and migration order
    pub const ALL: [StoreId; 23] = [
        StoreId::Audit,
        StoreId::BlindIndexEmail,
        StoreId::BlindIndexFirstName,
        StoreId::BlindIndexLastName,
        StoreId::Blog,
        StoreId::Cache,
        StoreId::Chat,
        StoreId::Cms,
        StoreId::Custom,
        StoreId::Entity,
        StoreId::Feed,
        StoreId::Geo,
        StoreId::Log,
        StoreId::Meta,
        StoreId::Session,
        StoreId::Setting,
        StoreId::Shop,
        StoreId::SqlFile,
        StoreId::Stats,
        StoreId::Subscription,
        StoreId::Task,
        StoreId::User,
        StoreId::Vault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreId::Audit => "audit",
            StoreId::BlindIndexEmail => "blind_index_email",
            StoreId::BlindIndexFirstName => "blind_index_first_name",
            StoreId::BlindIndexLastName => "blind_index_last_name",
            StoreId::Blog => "blog",
            StoreId::Cache => "cache",
            StoreId::Chat => "chat",
            StoreId::Cms => "cms",
            StoreId::Custom => "custom",
            StoreId::Entity => "entity",
            StoreId::Feed => "feed",
            StoreId::Geo => "geo",
            StoreId::Log => "log",
            StoreId::Meta => "meta",
            StoreId::Session => "session",
            StoreId::Setting => "setting",
            StoreId::Shop => "shop",
            StoreId::SqlFile => "sql_file",
            StoreId::Stats => "stats",
            StoreId::Subscription => "subscription",
            StoreId::Task => "task",
            StoreId::User => "user",
            StoreId::Vault => "vault",
        }
    }

    /// Whether the store is switched on by `stores`
    pub fn is_enabled(&self, stores: &StoresConfig) -> bool {
        self.lifecycle().is_some_and(|entry| (entry.enabled)(stores))
    }

    pub fn lifecycle(&self) -> Option<&'static StoreLifecycle> {
        LIFECYCLE.iter().find(|entry| entry.id == *self)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Initializer = fn(Database, &Config) -> Result<Arc<dyn Store>, StoreError>;
pub type Migrator = for<'a> fn(&'a dyn Store) -> BoxFuture<'a, Result<(), StoreError>>;

/// One row of the lifecycle table
pub struct StoreLifecycle {
    pub id: StoreId,
    pub enabled: fn(&StoresConfig) -> bool,
    pub initialize: Initializer,
    pub migrate: Migrator,
}

fn auto_migrate(store: &dyn Store) -> BoxFuture<'_, Result<(), StoreError>> {
    store.auto_migrate()
}

/// The file store creates its own table on first use
fn skip_migration(_store: &dyn Store) -> BoxFuture<'_, Result<(), StoreError>> {
    Box::pin(async { Ok(()) })
}

pub static LIFECYCLE: [StoreLifecycle; 23] = [
    StoreLifecycle {
        id: StoreId::Audit,
        enabled: |s| s.audit,
        initialize: initializers::audit,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::BlindIndexEmail,
        enabled: StoresConfig::blind_index_enabled,
        initialize: initializers::blind_index_email,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::BlindIndexFirstName,
        enabled: StoresConfig::blind_index_enabled,
        initialize: initializers::blind_index_first_name,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::BlindIndexLastName,
        enabled: StoresConfig::blind_index_enabled,
        initialize: initializers::blind_index_last_name,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Blog,
        enabled: |s| s.blog,
        initialize: initializers::blog,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Cache,
        enabled: |s| s.cache,
        initialize: initializers::cache,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Chat,
        enabled: |s| s.chat,
        initialize: initializers::chat,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Cms,
        enabled: |s| s.cms,
        initialize: initializers::cms,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Custom,
        enabled: |s| s.custom,
        initialize: initializers::custom,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Entity,
        enabled: |s| s.entity,
        initialize: initializers::entity,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Feed,
        enabled: |s| s.feed,
        initialize: initializers::feed,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Geo,
        enabled: |s| s.geo,
        initialize: initializers::geo,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Log,
        enabled: |s| s.log,
        initialize: initializers::log,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Meta,
        enabled: |s| s.meta,
        initialize: initializers::meta,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Session,
        enabled: |s| s.session,
        initialize: initializers::session,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Setting,
        enabled: |s| s.setting,
        initialize: initializers::setting,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Shop,
        enabled: |s| s.shop,
        initialize: initializers::shop,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::SqlFile,
        enabled: |s| s.sql_file,
        initialize: initializers::sql_file,
        migrate: skip_migration,
    },
    StoreLifecycle {
        id: StoreId::Stats,
        enabled: |s| s.stats,
        initialize: initializers::stats,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Subscription,
        enabled: |s| s.subscription,
        initialize: initializers::subscription,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Task,
        enabled: |s| s.task,
        initialize: initializers::task,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::User,
        enabled: |s| s.user,
        initialize: initializers::user,
        migrate: auto_migrate,
    },
    StoreLifecycle {
        id: StoreId::Vault,
        enabled: |s| s.vault,
        initialize: initializers::vault,
        migrate: auto_migrate,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_follows_boot_order() {
        let ids: Vec<StoreId> = LIFECYCLE.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, StoreId::ALL.to_vec());
    }

    #[test]
    fn test_blind_index_requires_user_and_vault() {
        let mut stores = StoresConfig {
            user: true,
            ..StoresConfig::default()
        };
        assert!(!StoreId::BlindIndexEmail.is_enabled(&stores));

        stores.vault = true;
        assert!(StoreId::BlindIndexEmail.is_enabled(&stores));
        assert!(StoreId::BlindIndexFirstName.is_enabled(&stores));
        assert!(StoreId::BlindIndexLastName.is_enabled(&stores));
    }

    #[test]
    fn test_all_disabled_by_default() {
        let stores = StoresConfig::default();
        assert!(StoreId::ALL.iter().all(|id| !id.is_enabled(&stores)));

        let all = StoresConfig::all_enabled();
        assert!(StoreId::ALL.iter().all(|id| id.is_enabled(&all)));
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = StoreId::ALL.iter().map(StoreId::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StoreId::ALL.len());
    }
}
