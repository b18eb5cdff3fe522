//! Applying an environment vault

use super::envelope;
use super::{KeyDeriver, ResourceTable, VaultError};
use crate::config::env::EnvSource;
use crate::config::SecretString;
use secrecy::ExposeSecret;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the vault for `env_tag`, e.g. `.env.production.vault`
pub fn vault_file_name(env_tag: &str) -> String {
    format!(".env.{}.vault", env_tag.trim().to_lowercase())
}

/// Decrypts vault files and overlays their variables on an environment
#[derive(Debug, Clone)]
pub struct VaultEnv {
    private_key: SecretString,
    deriver: KeyDeriver,
    resources: ResourceTable,
    base_dir: PathBuf,
}

impl VaultEnv {
    /// A vault reader for `private_key` with the built-in public key,
    /// the compiled-in resources and the current directory
    pub fn new(private_key: SecretString) -> Self {
        Self {
            private_key,
            deriver: KeyDeriver::default(),
            resources: ResourceTable::builtin(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_deriver(mut self, deriver: KeyDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn with_resources(mut self, resources: ResourceTable) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The symmetric key for this private key
    pub fn derive_key(&self) -> Result<String, VaultError> {
        self.deriver.derive(self.private_key.expose_secret().as_str().trim())
    }

    /// Decrypt the vault for `env_tag` and write its variables into `env`
    ///
    /// Returns the number of variables applied. The `testing` environment
    /// never reads a vault.
    ///
    /// # Errors
    ///
    /// Fails when the private key is blank, when the vault file exists in
    /// neither the embedded resources nor the base directory, or when it
    /// cannot be decrypted.
    pub fn hydrate(&self, env_tag: &str, env: &mut dyn EnvSource) -> Result<usize, VaultError> {
        if env_tag.trim().eq_ignore_ascii_case("testing") {
            return Ok(0);
        }

        let vars = self.open_file(env_tag)?;
        for (key, value) in &vars {
            env.set_var(key, value);
        }

        tracing::debug!(
            file = %vault_file_name(env_tag),
            variables = vars.len(),
            "Environment vault applied"
        );
        Ok(vars.len())
    }

    /// Locate and decrypt the vault for `env_tag`
    ///
    /// The file under the base directory is applied first and the embedded
    /// resource second, so embedded values win where both define a key.
    pub fn open_file(&self, env_tag: &str) -> Result<BTreeMap<String, String>, VaultError> {
        if self.private_key.expose_secret().as_str().trim().is_empty() {
            return Err(VaultError::PrivateKeyEmpty);
        }

        let name = vault_file_name(env_tag);
        let sources = self.locate(&name)?;
        let key = self.derive_key()?;

        let mut vars = BTreeMap::new();
        for contents in &sources {
            vars.extend(envelope::open(&key, contents)?);
        }
        Ok(vars)
    }

    /// Encrypt `vars` into the vault file for `env_tag` under the base directory
    pub fn seal_file(
        &self,
        env_tag: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<PathBuf, VaultError> {
        let key = self.derive_key()?;
        let sealed = envelope::seal(&key, vars)?;
        let path = self.base_dir.join(vault_file_name(env_tag));
        std::fs::write(&path, sealed).map_err(|e| VaultError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }

    /// Envelopes for `name`, on-disk first then embedded
    fn locate(&self, name: &str) -> Result<Vec<String>, VaultError> {
        let mut sources = Vec::with_capacity(2);

        let path = self.base_dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => sources.push(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(VaultError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }

        if let Some(contents) = self.resources.get(name) {
            sources.push(contents.to_string());
        }

        if sources.is_empty() {
            return Err(VaultError::NotFound {
                file: name.to_string(),
                searched: path.display().to_string(),
            });
        }
        Ok(sources)
    }
}
