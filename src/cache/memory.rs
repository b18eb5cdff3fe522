//! In-memory TTL cache

use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Concurrent string-keyed cache of opaque values with per-entry expiry
///
/// Expired entries are dropped lazily on read and in bulk by
/// [`MemoryCache::purge_expired`].
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    default_ttl: Option<Duration>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL applied by [`MemoryCache::set`] when none is given
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: Some(ttl),
        }
    }

    /// Store `value` under `key`; `None` falls back to the default TTL
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Option<Duration>)
    where
        T: Any + Send + Sync,
    {
        self.set_arc(key, Arc::new(value), ttl);
    }

    pub fn set_arc(
        &self,
        key: impl Into<String>,
        value: Arc<dyn Any + Send + Sync>,
        ttl: Option<Duration>,
    ) {
        // A TTL past the clock's range never expires
        let expires_at = ttl
            .or(self.default_ttl)
            .and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries.insert(key.into(), Entry { value, expires_at });
    }

    /// Value under `key` if present, unexpired and of type `T`
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired(now) => {
                return Arc::clone(&entry.value).downcast::<T>().ok();
            }
            Some(_) => true,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove `key`, returning whether it was present
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of unexpired entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_set_and_get_typed() {
        let cache = MemoryCache::new();
        cache.set("greeting", "hello".to_string(), None);
        cache.set("answer", 42u32, None);

        assert_eq!(cache.get::<String>("greeting").as_deref().map(String::as_str), Some("hello"));
        assert_eq!(cache.get::<u32>("answer").as_deref(), Some(&42));
        assert!(cache.get::<u64>("answer").is_none());
        assert!(cache.get::<u32>("missing").is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache.set("short", 1u8, Some(Duration::from_millis(20)));
        cache.set("long", 2u8, Some(Duration::from_secs(60)));
        assert!(cache.contains("short"));

        thread::sleep(Duration::from_millis(40));
        assert!(!cache.contains("short"));
        assert!(cache.get::<u8>("short").is_none());
        assert_eq!(cache.get::<u8>("long").as_deref(), Some(&2));
    }

    #[test]
    fn test_default_ttl_applies() {
        let cache = MemoryCache::with_default_ttl(Duration::from_millis(10));
        cache.set("a", 1u8, None);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unbounded_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("forever", 1u8, Some(Duration::MAX));

        assert_eq!(cache.get::<u8>("forever").as_deref(), Some(&1));
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_remove_and_overwrite() {
        let cache = MemoryCache::new();
        cache.set("k", 1i32, None);
        cache.set("k", 2i32, None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<i32>("k").as_deref(), Some(&2));
        assert!(cache.remove("k"));
        assert!(!cache.remove("k"));
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(MemoryCache::new());
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(format!("{worker}-{i}"), i, None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
