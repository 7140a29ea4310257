/// In-memory TTL caches for provider results.
///
/// Entries are immutable after insertion; lookups clone. Critical sections
/// are short (single map operation). Expired entries are dropped lazily on
/// read and swept opportunistically on write.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct TtlCache<T: Clone> {
    entries: Mutex<HashMap<String, (Instant, T)>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => return None,
        };
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &str, value: T) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(_) => return,
        };
        // Opportunistic sweep keeps the map from accumulating dead keys
        if entries.len() > 512 {
            let ttl = self.ttl;
            entries.retain(|_, (inserted, _)| inserted.elapsed() < ttl);
        }
        entries.insert(key.to_string(), (Instant::now(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_within_ttl() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(30));
        cache.insert("mint", 7);
        assert_eq!(cache.get("mint"), Some(7));
    }

    #[test]
    fn test_cache_miss_after_expiry() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::ZERO);
        cache.insert("mint", 7);
        assert_eq!(cache.get("mint"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_unknown_key() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(30));
        assert_eq!(cache.get("missing"), None);
    }
}
