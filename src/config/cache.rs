// src/config/cache.rs
// Two-tier response cache configuration

use serde::{Deserialize, Serialize};

/// Exact-match (Redis) cache tier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: i64,
    /// Cap on the in-process fallback store when Redis is unreachable
    pub max_entries: usize,
    pub key_prefix: String,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: super::helpers::env_bool("CACHE_ENABLED", true),
            ttl_seconds: super::helpers::env_parsed_or("CACHE_TTL_SECONDS", 86_400),
            max_entries: super::helpers::env_parsed_or("CACHE_MAX_ENTRIES", 1000),
            key_prefix: super::helpers::env_or("CACHE_KEY_PREFIX", "faq_cache:"),
        }
    }
}

/// Semantic (Qdrant) cache tier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    pub enabled: bool,
    /// Cosine similarity required for a semantic hit
    pub similarity_threshold: f32,
    /// Keyword overlap ratio required against the stored documents
    pub relevance_threshold: f32,
    /// Minimum answer confidence required before writing either tier
    pub min_confidence_to_cache: f32,
    pub ttl_seconds: i64,
    /// Expired points are swept every N requests
    pub cleanup_interval: u64,
    pub use_translation: bool,
    pub validate_relevance: bool,
}

impl SemanticCacheConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: super::helpers::env_bool("SEMANTIC_CACHE_ENABLED", true),
            similarity_threshold: super::helpers::env_parsed_or("SEMANTIC_CACHE_THRESHOLD", 0.92),
            relevance_threshold: super::helpers::env_parsed_or(
                "SEMANTIC_CACHE_RELEVANCE_THRESHOLD",
                0.30,
            ),
            min_confidence_to_cache: super::helpers::env_parsed_or(
                "SEMANTIC_CACHE_MIN_CONFIDENCE",
                0.7,
            ),
            ttl_seconds: super::helpers::env_parsed_or("SEMANTIC_CACHE_TTL_SECONDS", 86_400),
            cleanup_interval: super::helpers::env_parsed_or("SEMANTIC_CACHE_CLEANUP_INTERVAL", 100),
            use_translation: super::helpers::env_bool("SEMANTIC_CACHE_USE_TRANSLATION", true),
            validate_relevance: super::helpers::env_bool("SEMANTIC_CACHE_VALIDATE_RELEVANCE", true),
        }
    }
}
