//! Environment variable sources
//!
//! The loader never touches `std::env` directly. It reads through an
//! [`EnvSource`], so tests can hand it a [`MapEnv`] and vault hydration can
//! overlay decrypted values through the same interface.

use std::collections::HashMap;

/// Read/write access to a set of environment variables
pub trait EnvSource {
    /// Raw value of `key`, if present
    fn var(&self, key: &str) -> Option<String>;

    /// Set `key` to `value`, replacing any previous value
    fn set_var(&mut self, key: &str, value: &str);

    /// Value of `key` with surrounding whitespace removed, empty when unset
    fn trimmed(&self, key: &str) -> String {
        self.var(key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }

    /// Value of `key` interpreted as a boolean flag
    fn flag(&self, key: &str) -> bool {
        parse_flag(&self.trimmed(key))
    }
}

/// The process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// In-memory environment, used by tests and tooling
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Interpret a raw string as a boolean flag
///
/// `1`, `true`, `yes`, `y` and `on` (any case) are true; everything else,
/// including the empty string, is false.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
