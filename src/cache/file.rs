//! Filesystem-backed blob cache
//!
//! One file per key under the cache root. The file name is the SHA-256 of
//! the key, and the contents are a small JSON envelope holding the optional
//! expiry and the base64-encoded value. Writes land in a temporary file
//! that is renamed into place, so readers never see a partial write and the
//! last writer wins.

use super::CacheError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File whose presence marks the project root
pub const PROJECT_ROOT_MARKER: &str = "Cargo.toml";

/// Name of the cache directory under the project root
pub const CACHE_DIR_NAME: &str = ".cache";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    /// Unix milliseconds after which the entry is stale
    expires_at: Option<i64>,
    value: String,
}

/// Locate the cache directory for `start`
///
/// Walks upward from `start` to the first directory containing
/// [`PROJECT_ROOT_MARKER`] and returns its `.cache` child. Falls back to a
/// relative `.cache` when no marker is found.
pub fn cache_directory(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_ROOT_MARKER).is_file())
        .map(|root| root.join(CACHE_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(CACHE_DIR_NAME))
}

/// Durable key to bytes cache rooted at a directory
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open a cache at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Open the cache at the discovered project `.cache` directory
    pub fn discover() -> Result<Self, CacheError> {
        let cwd = std::env::current_dir().map_err(|e| CacheError::io(Path::new("."), e))?;
        Self::new(cache_directory(&cwd))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(hex::encode(Sha256::digest(key.as_bytes())))
    }

    /// Store `value` under `key`, optionally expiring after `ttl`
    pub fn save(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|ttl| {
            let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Utc::now().timestamp_millis().saturating_add(ttl)
        });
        let envelope = Envelope {
            expires_at,
            value: STANDARD.encode(value),
        };
        let bytes = serde_json::to_vec(&envelope)?;

        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, bytes).map_err(|e| CacheError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(CacheError::io(&path, e));
        }
        Ok(())
    }

    /// Bytes stored under `key`, or `None` when absent or expired
    ///
    /// Expired files are left in place for the next `save` to overwrite.
    pub fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        let envelope: Envelope = serde_json::from_slice(&bytes)?;
        if envelope
            .expires_at
            .is_some_and(|at| at <= Utc::now().timestamp_millis())
        {
            return Ok(None);
        }

        let value = STANDARD
            .decode(envelope.value.as_bytes())
            .map_err(|e| CacheError::Corrupt(e.to_string()))?;
        Ok(Some(value))
    }

    pub fn contains(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.fetch(key)?.is_some())
    }

    /// Remove `key`; removing an absent key is not an error
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Remove every entry
    pub fn flush(&self) -> Result<(), CacheError> {
        let entries = fs::read_dir(&self.root).map_err(|e| CacheError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(&self.root, e))?;
            let path = entry.path();
            if path.is_file() {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(CacheError::io(&path, e)),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_fetch() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("blobs")).unwrap();
        assert!(cache.root().is_dir());

        cache.save("thumb:42", b"\x89PNG bytes", None).unwrap();
        assert_eq!(cache.fetch("thumb:42").unwrap().as_deref(), Some(&b"\x89PNG bytes"[..]));
        assert!(cache.fetch("thumb:43").unwrap().is_none());
    }

    #[test]
    fn test_expired_entries_vanish() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        cache.save("flash", b"saved", Some(Duration::from_millis(10))).unwrap();
        thread::sleep(Duration::from_millis(30));
        assert!(!cache.contains("flash").unwrap());
    }

    #[test]
    fn test_expired_read_leaves_file_for_next_save() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        cache.save("flash", b"old", Some(Duration::from_millis(5))).unwrap();
        thread::sleep(Duration::from_millis(20));

        assert!(cache.fetch("flash").unwrap().is_none());
        assert!(cache.path_for("flash").is_file());

        cache.save("flash", b"new", None).unwrap();
        assert_eq!(cache.fetch("flash").unwrap().unwrap(), b"new");
    }

    #[test]
    fn test_unbounded_ttl_is_kept() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        cache.save("forever", b"v", Some(Duration::MAX)).unwrap();
        assert!(cache.contains("forever").unwrap());
    }

    #[test]
    fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        cache.save("k", b"one", None).unwrap();
        cache.save("k", b"two", None).unwrap();
        assert_eq!(cache.fetch("k").unwrap().unwrap(), b"two");
    }

    #[test]
    fn test_delete_and_flush() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path()).unwrap();
        cache.save("a", b"1", None).unwrap();
        cache.save("b", b"2", None).unwrap();

        cache.delete("a").unwrap();
        cache.delete("a").unwrap();
        assert!(!cache.contains("a").unwrap());

        cache.flush().unwrap();
        assert!(!cache.contains("b").unwrap());
    }

    #[test]
    fn test_concurrent_writers_leave_a_complete_value() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(FileCache::new(dir.path()).unwrap());
        let handles: Vec<_> = (0..8u8)
            .map(|n| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.save("shared", &[n; 64], None).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = cache.fetch("shared").unwrap().unwrap();
        assert_eq!(value.len(), 64);
        assert!(value.iter().all(|b| *b == value[0]));
    }

    #[test]
    fn test_cache_directory_walks_up_to_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_ROOT_MARKER), "[package]").unwrap();
        let nested = dir.path().join("src").join("bin");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(cache_directory(&nested), dir.path().join(".cache"));
    }

    #[test]
    fn test_cache_directory_falls_back_to_relative() {
        let dir = TempDir::new().unwrap();
        assert!(cache_directory(dir.path()).ends_with(CACHE_DIR_NAME));
    }
}
