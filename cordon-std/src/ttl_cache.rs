//! A tiny TTL-keyed cache, used for things like the token security-scan cache
//! (`cordon_security_scan_<mint>`, 1h TTL) that don't warrant a full crate.

use std::{
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// An in-memory cache where each entry expires `ttl` after insertion.
///
/// Not thread-safe; callers that need concurrent access should wrap this in
/// a `Mutex` or `RwLock`.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached value if present and not expired.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(&entry.value)
            } else {
                None
            }
        })
    }

    pub fn insert(&mut self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Drop all expired entries. Callers may run this periodically to bound
    /// memory use; `get` already ignores expired entries on its own.
    pub fn evict_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[cfg(test)]
mod test {
    use std::{thread::sleep, time::Duration};

    use super::*;

    #[test]
    fn expires_after_ttl() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(20));
        cache.insert("eth", 1);
        assert_eq!(cache.get(&"eth"), Some(&1));
        sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"eth"), None);
    }

    #[test]
    fn evict_expired_removes_stale_entries() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(10));
        cache.insert("a", 1);
        sleep(Duration::from_millis(20));
        cache.evict_expired();
        assert!(cache.get(&"a").is_none());
    }
}
