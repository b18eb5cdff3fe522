//! Tokenised secret vault
//!
//! Sensitive values are replaced by opaque tokens. Each value is sealed
//! with AES-256-GCM under a key derived from the caller's password, so the
//! database alone cannot reveal it. Stored values are base64 of
//! `nonce || ciphertext`. The `*_with_store_key` variants use the key
//! configured through `VAULT_STORE_KEY`.

use super::{new_id, now_millis, require_non_empty, run_migrations, validate_table_name, Store, StoreError};
use crate::adapters::Database;
use crate::config::{empty_secret, SecretString};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use std::any::Any;
use std::sync::Arc;

/// Prefix every token carries
pub const TOKEN_PREFIX: &str = "tk_";

const NONCE_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct VaultStoreOptions {
    pub vault_table_name: String,
    /// Password used by the `*_with_store_key` operations
    pub store_key: SecretString,
}

impl VaultStoreOptions {
    pub fn new(vault_table_name: impl Into<String>) -> Self {
        Self {
            vault_table_name: vault_table_name.into(),
            store_key: empty_secret(),
        }
    }
}

pub struct VaultStore {
    db: Database,
    vault_table: String,
    store_key: SecretString,
}

fn cipher(password: &str) -> Aes256Gcm {
    let digest = Sha256::digest(password.as_bytes());
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&digest))
}

fn seal(password: &str, value: &str) -> Result<String, StoreError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher(password)
        .encrypt(&nonce, value.as_bytes())
        .map_err(|_| StoreError::Crypto("encryption failed".to_string()))?;

    let mut sealed = nonce.to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(sealed))
}

fn unseal(password: &str, sealed: &str) -> Result<String, StoreError> {
    let bytes = STANDARD
        .decode(sealed.as_bytes())
        .map_err(|_| StoreError::Crypto("stored value is not valid base64".to_string()))?;
    if bytes.len() <= NONCE_LEN {
        return Err(StoreError::Crypto("stored value is truncated".to_string()));
    }

    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    let plaintext = cipher(password)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| StoreError::Crypto("wrong password or corrupt value".to_string()))?;
    String::from_utf8(plaintext).map_err(|e| StoreError::Crypto(e.to_string()))
}

impl VaultStore {
    pub fn new(db: Database, options: VaultStoreOptions) -> Result<Self, StoreError> {
        Ok(Self {
            db,
            vault_table: validate_table_name(&options.vault_table_name)?,
            store_key: options.store_key,
        })
    }

    fn store_key(&self) -> Result<&str, StoreError> {
        let key = self.store_key.expose_secret().as_str();
        if key.trim().is_empty() {
            return Err(StoreError::InvalidInput("vault store key is not configured".to_string()));
        }
        Ok(key)
    }

    /// [`VaultStore::token_create`] under the configured store key
    pub async fn token_create_with_store_key(&self, value: &str) -> Result<String, StoreError> {
        self.token_create(value, self.store_key()?).await
    }

    /// [`VaultStore::token_read`] under the configured store key
    pub async fn token_read_with_store_key(&self, token: &str) -> Result<String, StoreError> {
        self.token_read(token, self.store_key()?).await
    }

    /// Seal `value` and return the token that refers to it
    pub async fn token_create(&self, value: &str, password: &str) -> Result<String, StoreError> {
        require_non_empty("password", password)?;
        let token = format!("{TOKEN_PREFIX}{}", new_id());
        let now = now_millis();
        self.db
            .execute(
                &format!(
                    "INSERT INTO {} (id, vault_token, vault_value, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $5)",
                    self.vault_table
                ),
                &[new_id().into(), token.as_str().into(), seal(password, value)?.into(), now.into(), now.into()],
            )
            .await?;
        Ok(token)
    }

    /// Open the value behind `token`
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown token and
    /// [`StoreError::Crypto`] for a wrong password.
    pub async fn token_read(&self, token: &str, password: &str) -> Result<String, StoreError> {
        let row = self
            .db
            .query_one(
                &format!("SELECT vault_value FROM {} WHERE vault_token = $1", self.vault_table),
                &[token.into()],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("vault token {token}")))?;
        unseal(password, &row.string("vault_value"))
    }

    pub async fn token_delete(&self, token: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .execute(
                &format!("DELETE FROM {} WHERE vault_token = $1", self.vault_table),
                &[token.into()],
            )
            .await?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl Store for VaultStore {
    fn name(&self) -> &'static str {
        "vault"
    }

    fn table_names(&self) -> Vec<String> {
        vec![self.vault_table.clone()]
    }

    async fn auto_migrate(&self) -> Result<(), StoreError> {
        run_migrations(
            &self.db,
            &[format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id TEXT PRIMARY KEY, \
                 vault_token TEXT NOT NULL UNIQUE, \
                 vault_value TEXT NOT NULL, \
                 created_at BIGINT NOT NULL, \
                 updated_at BIGINT NOT NULL)",
                self.vault_table
            )],
        )
        .await
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
