//! Vault files compiled into the binary

use std::collections::HashMap;

/// Vault envelopes embedded at build time, keyed by file name.
///
/// Empty by default. A deployment that ships its vaults inside the binary
/// adds entries such as
/// `(".env.production.vault", include_str!("../../resources/.env.production.vault"))`.
const BUILTIN: &[(&str, &str)] = &[];

/// Named vault envelopes available without touching the filesystem
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: HashMap<String, String>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table of envelopes compiled into this binary
    pub fn builtin() -> Self {
        BUILTIN.iter().copied().collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.entries.insert(name.into(), contents.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ResourceTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, contents)| (name.to_string(), contents.to_string()))
                .collect(),
        }
    }
}
