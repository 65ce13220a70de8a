// src/cache/memory.rs
// In-process fallback store for the exact cache tier

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;

use super::CacheEntry;

/// Bounded in-process cache used when Redis is unreachable.
///
/// Eviction is least-frequently-used: when the cap is reached the entry
/// with the lowest hit count goes first (oldest timestamp breaks ties).
pub struct InMemoryCache {
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str, ttl_seconds: i64) -> Option<CacheEntry> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => {
                let age = Utc::now()
                    .signed_duration_since(entry.timestamp)
                    .num_seconds();
                age > ttl_seconds
            }
            None => return None,
        };

        if expired {
            entries.remove(key);
            return None;
        }

        let entry = entries.get_mut(key)?;
        entry.hit_count += 1;
        Some(entry.clone())
    }

    pub fn set(&self, key: &str, entry: CacheEntry) {
        let mut entries = self.entries.lock();

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            let victim = entries
                .iter()
                .min_by(|(_, a), (_, b)| {
                    a.hit_count
                        .cmp(&b.hit_count)
                        .then(a.timestamp.cmp(&b.timestamp))
                })
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                entries.remove(&victim);
            }
        }

        entries.insert(key.to_string(), entry);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, hits: u32) -> CacheEntry {
        CacheEntry {
            query_normalized: key.to_string(),
            query_original: key.to_string(),
            answer: format!("answer for {}", key),
            doc_ids: vec![],
            confidence: 0.9,
            timestamp: Utc::now(),
            hit_count: hits,
            user_rating: None,
        }
    }

    #[test]
    fn test_get_bumps_hit_count() {
        let cache = InMemoryCache::new(10);
        cache.set("k", entry("k", 0));

        assert_eq!(cache.get("k", 3600).unwrap().hit_count, 1);
        assert_eq!(cache.get("k", 3600).unwrap().hit_count, 2);
    }

    #[test]
    fn test_lfu_eviction_prefers_least_hit_entry() {
        let cache = InMemoryCache::new(2);
        cache.set("popular", entry("popular", 10));
        cache.set("rare", entry("rare", 0));

        // Cap reached: inserting a third entry evicts the least-hit one
        cache.set("new", entry("new", 0));

        assert_eq!(cache.count(), 2);
        assert!(cache.get("popular", 3600).is_some());
        assert!(cache.get("rare", 3600).is_none());
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = InMemoryCache::new(10);
        let mut stale = entry("old", 0);
        stale.timestamp = Utc::now() - chrono::Duration::seconds(7200);
        cache.set("old", stale);

        assert!(cache.get("old", 3600).is_none());
        assert_eq!(cache.count(), 0, "expired entry must be dropped");
    }
}
