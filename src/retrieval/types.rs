// src/retrieval/types.rs
// Shared retrieval result types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One scored document from a retrieval backend.
///
/// Produced by a dense or lexical search, consumed by fusion/reranking,
/// discarded at request end; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Value,
}

impl SearchResult {
    pub fn new(content: impl Into<String>, score: f32, metadata: Value) -> Self {
        Self {
            content: content.into(),
            score,
            metadata,
        }
    }

    /// Metadata string field helper (`category`, `intent`, `id`, ...)
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Aggregate output of one retrieval pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalOutput {
    pub docs: Vec<String>,
    pub scores: Vec<f32>,
    pub confidence: f32,
    pub best_doc_metadata: Value,
    pub results: Vec<SearchResult>,
}

impl RetrievalOutput {
    pub fn from_results(results: Vec<SearchResult>) -> Self {
        let docs: Vec<String> = results.iter().map(|r| r.content.clone()).collect();
        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        let confidence = scores.first().copied().unwrap_or(0.0);
        let best_doc_metadata = results
            .first()
            .map(|r| r.metadata.clone())
            .unwrap_or(Value::Null);

        Self {
            docs,
            scores,
            confidence,
            best_doc_metadata,
            results,
        }
    }
}
