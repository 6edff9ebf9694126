//! Bounded, time-expiring set of recently ingested review fingerprints.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

pub const DEFAULT_CAPACITY: usize = 5_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// LRU-evicted membership cache with a fixed per-entry lifetime.
///
/// Membership is only a hint: absence never proves a review is new, the
/// store-level check is authoritative. Expired entries are never reported.
pub struct RecentIdCache {
    entries: Mutex<LruCache<String, Instant>>,
    ttl: Duration,
}

impl RecentIdCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.contains_at(id, Instant::now())
    }

    pub fn add(&self, id: &str) {
        self.add_at(id, Instant::now());
    }

    /// Membership as observed at `now`; an expired entry is dropped.
    #[must_use]
    pub fn contains_at(&self, id: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(id)
            .map(|inserted| now.saturating_duration_since(*inserted) < self.ttl);
        match fresh {
            Some(true) => true,
            Some(false) => {
                entries.pop(id);
                false
            }
            None => false,
        }
    }

    /// Insert (or refresh) `id` as seen at `now`, evicting the least recently
    /// used entry when full.
    pub fn add_at(&self, id: &str, now: Instant) {
        self.entries.lock().put(id.to_string(), now);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecentIdCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl std::fmt::Debug for RecentIdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentIdCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_id_is_contained() {
        let cache = RecentIdCache::default();
        assert!(!cache.contains("a"));
        cache.add("a");
        assert!(cache.contains("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = RecentIdCache::new(10, Duration::from_secs(600));
        let t0 = Instant::now();
        cache.add_at("a", t0);
        assert!(cache.contains_at("a", t0 + Duration::from_secs(599)));
        assert!(!cache.contains_at("a", t0 + Duration::from_secs(600)));
        assert!(cache.is_empty(), "expired entry should be dropped");
    }

    #[test]
    fn lookups_do_not_extend_lifetime() {
        let cache = RecentIdCache::new(10, Duration::from_secs(10));
        let t0 = Instant::now();
        cache.add_at("a", t0);
        for s in 1..10 {
            assert!(cache.contains_at("a", t0 + Duration::from_secs(s)));
        }
        assert!(!cache.contains_at("a", t0 + Duration::from_secs(10)));
    }

    #[test]
    fn capacity_overflow_evicts_least_recently_used() {
        let cache = RecentIdCache::new(2, Duration::from_secs(600));
        let t0 = Instant::now();
        cache.add_at("a", t0);
        cache.add_at("b", t0);
        // Touch "a" so "b" becomes least recently used.
        assert!(cache.contains_at("a", t0));
        cache.add_at("c", t0);
        assert!(cache.contains_at("a", t0));
        assert!(!cache.contains_at("b", t0));
        assert!(cache.contains_at("c", t0));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let cache = RecentIdCache::new(0, Duration::from_secs(600));
        cache.add("a");
        assert!(cache.contains("a"));
    }
}
