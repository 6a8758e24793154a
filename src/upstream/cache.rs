use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

struct CachedBody {
    body: Arc<[u8]>,
    stored_at: Instant,
}

/// Time-to-live read-through cache for upstream response bodies.
///
/// Keyed by the exact request URL. Bounded by an LRU capacity so a crawl over
/// many page tokens cannot grow it without limit. A zero TTL turns every
/// operation into a no-op.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<LruCache<String, CachedBody>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CachedBody>> {
        // A panic while holding the lock cannot leave an entry half-written
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns a fresh body for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = self.lock();
        let fresh = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(Arc::clone(&entry.body)),
            Some(_) => None,
            None => return None,
        };

        if fresh.is_none() {
            entries.pop(key);
        }
        fresh
    }

    pub fn insert(&self, key: String, body: Arc<[u8]>) {
        if !self.is_enabled() {
            return;
        }
        self.lock().put(
            key,
            CachedBody {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(s: &str) -> Arc<[u8]> {
        Arc::from(s.as_bytes())
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(600), 8);
        cache.insert("https://a/feed".into(), body("xml"));

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(cache.get("https://a/feed").as_deref(), Some(&b"xml"[..]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_evicted() {
        let cache = ResponseCache::new(Duration::from_secs(600), 8);
        cache.insert("https://a/feed".into(), body("xml"));

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(cache.get("https://a/feed").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = ResponseCache::new(Duration::ZERO, 8);
        cache.insert("k".into(), body("v"));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_bound_evicts_least_recent() {
        let cache = ResponseCache::new(Duration::from_secs(60), 2);
        cache.insert("a".into(), body("1"));
        cache.insert("b".into(), body("2"));
        assert!(cache.get("a").is_some()); // "b" is now least recently used
        cache.insert("c".into(), body("3"));

        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let cache = ResponseCache::new(Duration::from_secs(60), 0);
        cache.insert("a".into(), body("1"));
        assert_eq!(cache.len(), 1);
    }
}
