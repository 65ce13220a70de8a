// src/config/retrieval.rs
// Hybrid retrieval, reranking, and multi-hop configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Results kept after fusion
    pub final_top_k: usize,
    /// Dense/lexical candidate pools are this multiple of final_top_k
    pub candidate_multiplier: usize,
    /// Probe-search score at which expansion and reranking are skipped
    pub confidence_threshold: f32,
    /// Results kept after cross-encoder reranking; None disables reranking
    pub top_k_rerank: Option<usize>,
    pub use_expansion: bool,
    /// Primary language of the document corpus, drives the tsquery config
    pub document_language: String,
    /// Category filter requires at least this classification confidence
    pub filter_confidence_threshold: f32,
    /// Filtered searches with fewer hits than this fall back to unfiltered
    pub filter_min_docs: usize,
}

impl RetrievalConfig {
    pub fn from_env() -> Self {
        let top_k_rerank: i64 = super::helpers::env_parsed_or("RETRIEVAL_TOP_K_RERANK", 5);
        Self {
            final_top_k: super::helpers::env_parsed_or("RETRIEVAL_FINAL_TOP_K", 10),
            candidate_multiplier: super::helpers::env_parsed_or("RETRIEVAL_CANDIDATE_MULTIPLIER", 2),
            confidence_threshold: super::helpers::env_parsed_or("RETRIEVAL_CONFIDENCE_THRESHOLD", 0.5),
            top_k_rerank: (top_k_rerank > 0).then_some(top_k_rerank as usize),
            use_expansion: super::helpers::env_bool("RETRIEVAL_USE_EXPANSION", true),
            document_language: super::helpers::env_or("DEFAULT_LANGUAGE", "ru"),
            filter_confidence_threshold: super::helpers::env_parsed_or(
                "FILTER_CONFIDENCE_THRESHOLD",
                0.5,
            ),
            filter_min_docs: super::helpers::env_parsed_or("FILTER_MIN_DOCS", 2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultihopConfig {
    pub enabled: bool,
    /// Merged context token budget, estimated as chars / 4
    pub max_context_tokens: usize,
}

impl MultihopConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: super::helpers::env_bool("MULTIHOP_ENABLED", true),
            max_context_tokens: super::helpers::env_parsed_or("MULTIHOP_MAX_CONTEXT_TOKENS", 5000),
        }
    }
}
