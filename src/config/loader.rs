//! Configuration loader driven by the environment
//!
//! Loading happens in this order:
//! 1. Load `.env` into the process environment if present (best effort)
//! 2. If `ENVENC_USED` is set, derive the vault key and overlay the
//!    decrypted `.env.<env>.vault` variables onto the environment
//! 3. Walk the variable table, typing each value and recording every
//!    missing or invalid entry
//! 4. Apply the cross-field rules that the table cannot express
//! 5. Return the config, or one [`ValidationError`] listing every problem

use super::accumulator::{ConfigError, LoadAccumulator, ValidationError};
use super::env::{EnvSource, ProcessEnv};
use super::keys;
use super::schema::Config;
use super::secret_string;
use super::variables::variables;
use crate::vault::{KeyDeriver, ResourceTable, VaultEnv};
use std::path::{Path, PathBuf};

/// Builds a [`Config`] from an environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    deriver: KeyDeriver,
    resources: ResourceTable,
    vault_dir: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            deriver: KeyDeriver::default(),
            resources: ResourceTable::builtin(),
            vault_dir: PathBuf::from("."),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_deriver(mut self, deriver: KeyDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn with_resources(mut self, resources: ResourceTable) -> Self {
        self.resources = resources;
        self
    }

    /// Directory searched for `.env.<env>.vault` files
    pub fn with_vault_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vault_dir = dir.into();
        self
    }

    /// Load a config from `env`
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] carrying every missing or invalid
    /// variable found, in table order.
    pub fn load(&self, env: &mut dyn EnvSource) -> Result<Config, ValidationError> {
        let mut acc = LoadAccumulator::new();

        let derived_key = self.hydrate_vault(env, &mut acc);

        let mut config = Config::default();
        for variable in variables() {
            variable.apply(&*env, &mut config, &mut acc);
        }

        if let Some(derived_key) = derived_key {
            config.env_encryption.derived_key = secret_string(derived_key);
        }

        if config.stores.user_store_vault_enabled && !config.stores.vault {
            acc.push(ConfigError::Requires {
                key: keys::USER_STORE_USE_VAULT,
                requires: keys::VAULT_STORE_USED,
            });
        }

        config.stripe.used = config.stripe.keys_present();

        if config.translation.default_language.trim().is_empty() {
            config.translation.default_language = super::schema::default_language();
        }
        if config.translation.languages.is_empty() {
            config.translation.languages = super::schema::default_languages();
        }

        match acc.err() {
            Some(err) => Err(err),
            None => Ok(config),
        }
    }

    /// Derive the vault key and apply the vault, returning the derived key
    ///
    /// A blank private key is left for the variable table to report.
    fn hydrate_vault(&self, env: &mut dyn EnvSource, acc: &mut LoadAccumulator) -> Option<String> {
        if !env.flag(keys::ENVENC_USED) {
            return None;
        }

        let private_key = env.trimmed(keys::ENVENC_KEY_PRIVATE);
        if private_key.is_empty() {
            return None;
        }

        let vault = VaultEnv::new(secret_string(private_key))
            .with_deriver(self.deriver.clone())
            .with_resources(self.resources.clone())
            .with_base_dir(self.vault_dir.clone());

        let derived_key = match vault.derive_key() {
            Ok(key) => key,
            Err(e) => {
                acc.push(e);
                return None;
            }
        };

        let env_tag = env.trimmed(keys::APP_ENV);
        if let Err(e) = vault.hydrate(&env_tag, env) {
            acc.push(e);
        }

        Some(derived_key)
    }
}

/// Load `.env` from the working directory, if present
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
}

/// Load a specific dotenv file, if present
pub fn load_dotenv_from(path: &Path) {
    if dotenvy::from_path(path).is_ok() {
        tracing::debug!(path = %path.display(), "Loaded env file");
    }
}

/// Load the configuration from the process environment
///
/// # Examples
///
/// ```no_run
/// use webscaffold::config::load_config;
///
/// match load_config() {
///     Ok(config) => println!("listening on {}", config.app.address()),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
pub fn load_config() -> Result<Config, ValidationError> {
    load_dotenv();
    ConfigLoader::default().load(&mut ProcessEnv)
}

/// Load the configuration from an explicit environment
pub fn load_config_from(env: &mut dyn EnvSource) -> Result<Config, ValidationError> {
    ConfigLoader::default().load(env)
}
