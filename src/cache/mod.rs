//! Process-wide caches owned by the registry
//!
//! - [`MemoryCache`] - concurrent in-memory TTL cache of opaque values
//! - [`FileCache`] - durable blob cache under the project `.cache` directory

pub mod file;
pub mod memory;

pub use file::{cache_directory, FileCache};
pub use memory::MemoryCache;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache entry is corrupt: {0}")]
    Corrupt(String),
}

impl CacheError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
