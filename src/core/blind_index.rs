//! Blind index rebuild
//!
//! Walks every user and brings the three blind indexes in line with the
//! current user fields. Fields holding vault tokens are opened with the
//! configured vault store key first. Blank values are removed from the
//! index rather than indexed.

use crate::registry::Registry;
use crate::stores::blind_index::BlindIndexStore;
use crate::stores::user::User;
use crate::stores::vault::{VaultStore, TOKEN_PREFIX};
use crate::stores::StoreError;

/// Rebuild the email, first name and last name indexes
///
/// Returns the number of users visited, or zero when the user store or
/// any blind index store is not enabled. The email index is rebuilt last.
pub async fn rebuild_blind_indexes(registry: &Registry) -> Result<usize, StoreError> {
    let (Some(users), Some(email), Some(first_name), Some(last_name)) = (
        registry.user_store(),
        registry.blind_index_email_store(),
        registry.blind_index_first_name_store(),
        registry.blind_index_last_name_store(),
    ) else {
        return Ok(0);
    };
    let vault = registry.vault_store();

    let users = users.list().await?;
    let fields: [(&BlindIndexStore, fn(&User) -> &str); 3] = [
        (first_name.as_ref(), first_name_of),
        (last_name.as_ref(), last_name_of),
        (email.as_ref(), email_of),
    ];

    for (index, field) in fields {
        for user in &users {
            let value = plain_value(vault.as_deref(), field(user)).await?;
            if value.trim().is_empty() {
                index.remove(&user.id).await?;
            } else {
                index.upsert(&user.id, &value).await?;
            }
        }
    }

    tracing::debug!(users = users.len(), "Blind indexes rebuilt");
    Ok(users.len())
}

fn first_name_of(user: &User) -> &str {
    &user.first_name
}

fn last_name_of(user: &User) -> &str {
    &user.last_name
}

fn email_of(user: &User) -> &str {
    &user.email
}

async fn plain_value(vault: Option<&VaultStore>, value: &str) -> Result<String, StoreError> {
    match vault {
        Some(vault) if value.starts_with(TOKEN_PREFIX) => vault.token_read_with_store_key(value).await,
        _ => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use crate::config::{secret_string, Config, DatabaseConfig};
    use std::sync::Arc;

    async fn registry(vault_key: &str) -> (Registry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database = DatabaseConfig {
            driver: "sqlite".into(),
            database: ":memory:".into(),
            ..DatabaseConfig::default()
        };
        config.stores.user = true;
        config.stores.vault = true;
        config.stores.vault_store_key = secret_string(vault_key.to_string());

        let registry = Registry::builder(config)
            .file_cache(Arc::new(FileCache::new(dir.path()).unwrap()))
            .build()
            .await
            .unwrap();
        (registry, dir)
    }

    #[tokio::test]
    async fn test_rebuild_indexes_plain_and_tokenized_fields() {
        let (registry, _dir) = registry("vault-key").await;
        let users = registry.user_store().unwrap();
        let vault = registry.vault_store().unwrap();

        let mut ada = User::new("ada@example.com");
        ada.first_name = "Ada".into();
        ada.last_name = vault.token_create_with_store_key("Lovelace").await.unwrap();
        let ada = users.create_user(&ada).await.unwrap();

        let token = vault.token_create_with_store_key("grace@example.com").await.unwrap();
        let grace = users.create_user(&User::new(token)).await.unwrap();

        assert_eq!(rebuild_blind_indexes(&registry).await.unwrap(), 2);

        let email = registry.blind_index_email_store().unwrap();
        assert_eq!(email.search("GRACE@example.com").await.unwrap(), vec![grace.id]);
        assert_eq!(email.search("ada@example.com").await.unwrap(), vec![ada.id.clone()]);

        let last_name = registry.blind_index_last_name_store().unwrap();
        assert_eq!(last_name.search("lovelace").await.unwrap(), vec![ada.id]);
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_fields_are_removed_from_the_index() {
        let (registry, _dir) = registry("vault-key").await;
        let user = registry
            .user_store()
            .unwrap()
            .create_user(&User::new("a@example.com"))
            .await
            .unwrap();
        let first_name = registry.blind_index_first_name_store().unwrap();
        first_name.upsert(&user.id, "stale").await.unwrap();

        rebuild_blind_indexes(&registry).await.unwrap();
        assert!(first_name.search("stale").await.unwrap().is_empty());
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_nothing_to_do_without_user_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database = DatabaseConfig {
            driver: "sqlite".into(),
            database: ":memory:".into(),
            ..DatabaseConfig::default()
        };
        let registry = Registry::builder(config)
            .file_cache(Arc::new(FileCache::new(dir.path()).unwrap()))
            .build()
            .await
            .unwrap();
        assert_eq!(rebuild_blind_indexes(&registry).await.unwrap(), 0);
    }
}
