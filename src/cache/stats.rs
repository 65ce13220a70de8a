// src/cache/stats.rs
// Response cache hit/miss accounting

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Lock-free counters shared by both cache tiers.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    total_requests: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    semantic_hits: AtomicU64,
    stores: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub semantic_hits: u64,
    pub stores: u64,
    pub hit_rate: f64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_semantic_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.semantic_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let total = self.total_requests.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        let hit_rate = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        CacheStatsSnapshot {
            total_requests: total,
            cache_hits: hits,
            cache_misses: self.misses.load(Ordering::Relaxed),
            semantic_hits: self.semantic_hits.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_accounting() {
        let metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.record_semantic_hit();
        metrics.record_miss();
        metrics.record_miss();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 4);
        assert_eq!(snap.cache_hits, 2);
        assert_eq!(snap.semantic_hits, 1);
        assert_eq!(snap.cache_misses, 2);
        assert!((snap.hit_rate - 50.0).abs() < 1e-9);
    }
}
