// src/cache/mod.rs

//! Two-tier response cache.
//!
//! Tier A: exact match on the normalized question, stored in Redis under
//! `faq_cache:<normalized>` with a TTL, falling back to a bounded in-process
//! LFU store when Redis is unreachable.
//!
//! Tier B: semantic similarity over cached question embeddings in Qdrant
//! (see `semantic.rs`).

pub mod memory;
pub mod normalizer;
pub mod semantic;
pub mod stats;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::clients::RedisConnector;
use crate::config::cache::CacheConfig;
use memory::InMemoryCache;
use stats::CacheMetrics;

pub use normalizer::normalize;
pub use semantic::SemanticCache;
pub use stats::CacheStatsSnapshot;

/// A cached FAQ answer, serialized to JSON in Redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query_normalized: String,
    pub query_original: String,
    pub answer: String,
    #[serde(default)]
    pub doc_ids: Vec<String>,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub hit_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f32>,
}

impl CacheEntry {
    pub fn new(
        query_normalized: String,
        query_original: String,
        answer: String,
        doc_ids: Vec<String>,
        confidence: f32,
    ) -> Self {
        Self {
            query_normalized,
            query_original,
            answer,
            doc_ids,
            confidence,
            timestamp: Utc::now(),
            hit_count: 0,
            user_rating: None,
        }
    }
}

/// Exact-match cache tier.
pub struct ResponseCache {
    redis: RedisConnector,
    fallback: InMemoryCache,
    metrics: CacheMetrics,
    prefix: String,
    ttl_seconds: i64,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(redis: RedisConnector, config: &CacheConfig) -> Self {
        Self {
            redis,
            fallback: InMemoryCache::new(config.max_entries),
            metrics: CacheMetrics::new(),
            prefix: config.key_prefix.clone(),
            ttl_seconds: config.ttl_seconds,
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn key(&self, normalized: &str) -> String {
        format!("{}{}", self.prefix, normalized)
    }

    /// Look up a normalized key. A hit bumps `hit_count` by exactly one and
    /// writes the bump back so the counter survives restarts.
    pub async fn get(&self, normalized: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }

        if self.redis.is_available() {
            match self.redis.get(&self.key(normalized)).await {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                    Ok(mut entry) => {
                        entry.hit_count += 1;
                        if let Err(e) = self.write(normalized, &entry).await {
                            error!("Cache hit-count writeback failed: {}", e);
                        }
                        return Some(entry);
                    }
                    Err(e) => {
                        error!("Corrupt cache entry for '{}': {}", normalized, e);
                        return None;
                    }
                },
                Ok(None) => return None,
                Err(e) => {
                    error!("Cache get failed: {}", e);
                    return None;
                }
            }
        }

        self.fallback.get(normalized, self.ttl_seconds)
    }

    pub async fn set(&self, normalized: &str, entry: CacheEntry) -> bool {
        if !self.enabled {
            return false;
        }

        if self.redis.is_available() {
            match self.write(normalized, &entry).await {
                Ok(()) => {
                    self.metrics.record_store();
                    true
                }
                Err(e) => {
                    error!("Cache set failed: {}", e);
                    false
                }
            }
        } else {
            self.fallback.set(normalized, entry);
            self.metrics.record_store();
            true
        }
    }

    async fn write(&self, normalized: &str, entry: &CacheEntry) -> Result<()> {
        let raw = serde_json::to_string(entry)?;
        self.redis
            .setex(&self.key(normalized), self.ttl_seconds as u64, &raw)
            .await
    }

    pub async fn delete(&self, normalized: &str) -> bool {
        if self.redis.is_available() {
            self.redis
                .delete(&self.key(normalized))
                .await
                .map(|n| n > 0)
                .unwrap_or(false)
        } else {
            self.fallback.delete(normalized)
        }
    }

    /// Remove every entry under the cache prefix.
    pub async fn clear(&self) -> Result<()> {
        if self.redis.is_available() {
            let keys = self.redis.scan_match(&format!("{}*", self.prefix)).await?;
            for key in keys {
                self.redis.delete(&key).await?;
            }
            debug!("Cleared exact cache tier");
        } else {
            self.fallback.clear();
        }
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        if !self.redis.is_available() {
            // Fallback tier is always usable
            return true;
        }
        self.redis.ping().await.is_ok()
    }
}
