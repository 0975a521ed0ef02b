use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    stored_at: Instant,
    value: V,
}

/// Time-bounded memo placed in front of an outbound call.
///
/// A zero TTL disables caching entirely. The lock is never held across an
/// await; concurrent misses for the same key may both reach the service.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        TtlCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if self.ttl.is_zero() {
            return None;
        }

        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
        }
        entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        if self.ttl.is_zero() {
            return;
        }

        let entry = CacheEntry {
            stored_at: Instant::now(),
            value,
        };
        let mut entries = self.entries.lock();
        entries.retain(|_, existing| existing.stored_at.elapsed() < self.ttl);
        entries.insert(key, entry);
    }

    /// Returns the cached value or runs `fetch` and stores a successful result.
    pub async fn get_or_try_insert_with<E, F, Fut>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = cache
                .get_or_try_insert_with("tekken 7".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let failed = cache
            .get_or_try_insert_with("key", || async { Err::<u32, _>("down") })
            .await;
        assert_eq!(failed, Err("down"));
        assert_eq!(cache.get(&"key"), None);
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO);
        cache.insert("key", 1);
        assert_eq!(cache.get(&"key"), None);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(5));
        cache.insert("key", 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"key"), None);
    }
}
