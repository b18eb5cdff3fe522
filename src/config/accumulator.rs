//! Multi-error accumulation during configuration loading
//!
//! A single load reports every problem it finds instead of stopping at the
//! first one. Helpers record errors and hand back whatever value they read,
//! so the caller keeps going.

use super::env::EnvSource;
use crate::vault::VaultError;
use std::fmt;
use thiserror::Error;

/// A required environment variable was blank or unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingEnv {
    pub key: String,
    pub context: String,
}

impl MissingEnv {
    pub fn new(key: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            context: context.into(),
        }
    }
}

impl fmt::Display for MissingEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config: required env {:?} is missing", self.key)?;
        if !self.context.is_empty() {
            write!(f, ": {}", self.context)?;
        }
        Ok(())
    }
}

impl std::error::Error for MissingEnv {}

/// A single problem found while building a [`Config`](super::Config)
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Missing(#[from] MissingEnv),

    #[error("config: {key} requires {requires} to be true")]
    Requires {
        key: &'static str,
        requires: &'static str,
    },

    #[error("config: env {key:?} has invalid {expected} value {value:?}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("config: {0}")]
    Vault(#[from] VaultError),
}

impl ConfigError {
    /// Key of the missing variable, when this is a [`ConfigError::Missing`]
    pub fn missing_key(&self) -> Option<&str> {
        match self {
            ConfigError::Missing(missing) => Some(&missing.key),
            _ => None,
        }
    }
}

/// Every error collected during one configuration load
#[derive(Debug, Clone)]
pub struct ValidationError {
    errors: Vec<ConfigError>,
}

impl ValidationError {
    /// A copy of the underlying errors, in the order they were recorded
    pub fn errors(&self) -> Vec<ConfigError> {
        self.errors.clone()
    }

    /// Keys of all missing-variable errors, in order
    pub fn missing_keys(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter_map(ConfigError::missing_key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config: validation failed:")?;
        for error in &self.errors {
            write!(f, "\n - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Collects errors while a configuration is being assembled
#[derive(Debug, Default)]
pub struct LoadAccumulator {
    errors: Vec<ConfigError>,
}

impl LoadAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` if there is one
    pub fn add(&mut self, error: Option<ConfigError>) {
        if let Some(error) = error {
            self.errors.push(error);
        }
    }

    /// Record an error unconditionally
    pub fn push(&mut self, error: impl Into<ConfigError>) {
        self.errors.push(error.into());
    }

    /// Read `key` (trimmed); a blank value is recorded as missing
    ///
    /// The empty string is returned in that case and loading carries on.
    pub fn must_string(&mut self, env: &dyn EnvSource, key: &str, context: &str) -> String {
        let value = env.trimmed(key);
        if value.is_empty() {
            self.push(MissingEnv::new(key, context));
        }
        value
    }

    /// Record `key` as missing when `condition` holds and `value` is blank
    pub fn must_when(&mut self, condition: bool, key: &str, context: &str, value: &str) {
        if condition && value.trim().is_empty() {
            self.push(MissingEnv::new(key, context));
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The aggregated error, or `None` when nothing was recorded
    pub fn err(&self) -> Option<ValidationError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(ValidationError {
                errors: self.errors.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::MapEnv;

    #[test]
    fn test_missing_env_display() {
        let plain = MissingEnv::new("APP_HOST", "");
        assert_eq!(plain.to_string(), "config: required env \"APP_HOST\" is missing");

        let with_context = MissingEnv::new("DB_HOST", "required when `DB_DRIVER` is not sqlite");
        assert_eq!(
            with_context.to_string(),
            "config: required env \"DB_HOST\" is missing: required when `DB_DRIVER` is not sqlite"
        );
    }

    #[test]
    fn test_add_ignores_none() {
        let mut acc = LoadAccumulator::new();
        acc.add(None);
        assert!(acc.err().is_none());

        acc.add(Some(MissingEnv::new("APP_PORT", "").into()));
        assert_eq!(acc.err().unwrap().len(), 1);
    }

    #[test]
    fn test_must_string_records_and_continues() {
        let env = MapEnv::new().with("APP_HOST", " localhost ");
        let mut acc = LoadAccumulator::new();

        assert_eq!(acc.must_string(&env, "APP_HOST", ""), "localhost");
        assert_eq!(acc.must_string(&env, "APP_PORT", "set the port"), "");
        assert_eq!(acc.must_string(&env, "APP_ENV", ""), "");

        let err = acc.err().unwrap();
        assert_eq!(err.missing_keys(), vec!["APP_PORT", "APP_ENV"]);
    }

    #[test]
    fn test_must_when_only_fires_on_condition() {
        let mut acc = LoadAccumulator::new();
        acc.must_when(false, "CMS_STORE_TEMPLATE_ID", "", "");
        acc.must_when(true, "VAULT_STORE_KEY", "", "present");
        assert!(!acc.has_errors());

        acc.must_when(true, "CMS_STORE_TEMPLATE_ID", "", "   ");
        assert_eq!(acc.err().unwrap().missing_keys(), vec!["CMS_STORE_TEMPLATE_ID"]);
    }

    #[test]
    fn test_validation_error_renders_one_line_per_error() {
        let mut acc = LoadAccumulator::new();
        acc.push(MissingEnv::new("APP_HOST", ""));
        acc.push(ConfigError::Requires {
            key: "USER_STORE_USE_VAULT",
            requires: "VAULT_STORE_USED",
        });

        let rendered = acc.err().unwrap().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "config: validation failed:");
        assert!(lines[1].contains("APP_HOST"));
        assert!(lines[2].contains("USER_STORE_USE_VAULT requires VAULT_STORE_USED"));
    }

    #[test]
    fn test_errors_returns_a_copy() {
        let mut acc = LoadAccumulator::new();
        acc.push(MissingEnv::new("APP_HOST", ""));
        let err = acc.err().unwrap();

        let mut copy = err.errors();
        copy.clear();
        assert_eq!(err.len(), 1);
    }
}
