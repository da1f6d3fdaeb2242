//! Bounded in-memory cache for external lookup results.
//!
//! Keyed by lookup term. Entries expire after a TTL and the least recently
//! used entry is dropped when the cache is at capacity. Same locking
//! discipline as the job registry: one mutex, held only for map access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    last_used: Instant,
}

/// TTL + LRU cache for lookup results.
///
/// Clones share the same underlying map.
#[derive(Clone)]
pub struct LookupCache<T> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
    capacity: usize,
}

impl<T: Clone> LookupCache<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            capacity,
        }
    }

    /// Fetch a fresh entry, marking it as recently used. Expired entries
    /// are removed on access and report a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        let expired = entries
            .get(key)
            .map(|entry| entry.inserted_at.elapsed() > self.ttl)?;
        if expired {
            entries.remove(key);
            return None;
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.last_used = Instant::now();
            return Some(entry.value.clone());
        }
        None
    }

    /// Insert or replace an entry. When the cache is at capacity, the least
    /// recently used entry is evicted first.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let lru = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(lru_key) = lru {
                entries.remove(&lru_key);
            }
        }

        let now = Instant::now();
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                last_used: now,
            },
        );
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn prune(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_inserted_value() {
        let cache = LookupCache::new(Duration::from_secs(60), 10);
        cache.insert("rust", vec!["post"]);
        assert_eq!(cache.get("rust"), Some(vec!["post"]));
        assert_eq!(cache.get("unknown"), None);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = LookupCache::new(Duration::ZERO, 10);
        cache.insert("rust", 1);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("rust"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_prune_drops_expired_entries() {
        let cache = LookupCache::new(Duration::ZERO, 10);
        cache.insert("a", 1);
        cache.insert("b", 2);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.prune(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = LookupCache::new(Duration::from_secs(60), 2);
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b", 2);
        std::thread::sleep(Duration::from_millis(2));

        // Touch "a" so "b" becomes the LRU entry.
        assert_eq!(cache.get("a"), Some(1));
        std::thread::sleep(Duration::from_millis(2));

        cache.insert("c", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_replacing_existing_key_does_not_evict() {
        let cache = LookupCache::new(Duration::from_secs(60), 2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(10));
        assert_eq!(cache.get("b"), Some(2));
    }
}
