// src/cache/semantic.rs
// Semantic cache tier: vector similarity over cached question embeddings

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use once_cell::sync::Lazy;
use qdrant_client::qdrant::PointStruct;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::qdrant::{json_to_payload, payload_to_json, timestamp_at_least};
use crate::clients::{EmbeddingClient, VectorStore};
use crate::config::cache::SemanticCacheConfig;

/// A Tier-B hit before relevance validation.
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub answer: String,
    pub doc_ids: Vec<String>,
    pub score: f32,
    pub cached_question: String,
}

// Stop words used only by the relevance check; deliberately smaller than
// the normalizer lists.
static RELEVANCE_STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "как", "что", "где", "когда", "почему", "какие", "какой", "есть", "в", "на", "для",
        "с", "и", "или", "a", "the", "is", "are", "in", "on", "for", "with", "and", "or",
        "what", "where", "when", "how", "why", "which",
    ]
    .into_iter()
    .collect()
});

/// Validate that cached documents are relevant to the question: extract
/// question tokens longer than 3 chars, drop stop words, and require their
/// overlap ratio against the concatenated stored docs to reach `threshold`.
pub fn validate_doc_relevance(question: &str, docs: &[String], threshold: f32) -> bool {
    if docs.is_empty() {
        return false;
    }

    // Trim punctuation off each token ("password," -> "password") the same
    // way the normalizer does, or keywords next to a comma never match
    let keywords: HashSet<String> = question
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > 3 && !RELEVANCE_STOP_WORDS.contains(w.as_str()))
        .collect();

    if keywords.is_empty() {
        // Nothing to check against, do not reject the hit
        return true;
    }

    let docs_text = docs.join(" ").to_lowercase();
    let matches = keywords.iter().filter(|w| docs_text.contains(*w)).count();
    let ratio = matches as f32 / keywords.len() as f32;

    debug!(
        "Doc relevance: {}/{} keywords matched ({:.0}%)",
        matches,
        keywords.len(),
        ratio * 100.0
    );
    ratio >= threshold
}

/// Vector-similarity cache over the `semantic_cache` collection.
pub struct SemanticCache {
    vector_store: Arc<VectorStore>,
    embeddings: Arc<EmbeddingClient>,
    config: SemanticCacheConfig,
    collection: String,
    collection_ready: AtomicBool,
    request_counter: AtomicU64,
}

impl SemanticCache {
    pub fn new(
        vector_store: Arc<VectorStore>,
        embeddings: Arc<EmbeddingClient>,
        config: SemanticCacheConfig,
        collection: String,
    ) -> Self {
        Self {
            vector_store,
            embeddings,
            config,
            collection,
            collection_ready: AtomicBool::new(false),
            request_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    async fn ensure_collection(&self) -> Result<()> {
        if self.collection_ready.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.vector_store
            .ensure_collection(&self.collection, self.embeddings.dimension())
            .await?;
        self.collection_ready.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Top-1 similarity lookup with the TTL filter applied server-side.
    ///
    /// Returns the computed query embedding alongside the result so the
    /// store path can reuse it instead of embedding twice. Never fails the
    /// pipeline: backend errors degrade to a miss.
    pub async fn lookup(
        &self,
        question: &str,
        translated_query: Option<&str>,
    ) -> (Option<SemanticHit>, Option<Vec<f32>>) {
        if !self.config.enabled {
            return (None, None);
        }

        match self.lookup_inner(question, translated_query).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Semantic cache lookup degraded to miss: {}", e);
                (None, None)
            }
        }
    }

    async fn lookup_inner(
        &self,
        question: &str,
        translated_query: Option<&str>,
    ) -> Result<(Option<SemanticHit>, Option<Vec<f32>>)> {
        self.ensure_collection().await?;
        self.maybe_cleanup().await;

        let query_text = if self.config.use_translation {
            translated_query.filter(|t| !t.is_empty()).unwrap_or(question)
        } else {
            question
        };

        let embedding = self.embeddings.embed(query_text, true).await?;

        let cutoff = Utc::now().timestamp() as f64 - self.config.ttl_seconds as f64;
        let points = self
            .vector_store
            .query(
                &self.collection,
                embedding.clone(),
                1,
                Some(timestamp_at_least(cutoff)),
                true,
            )
            .await?;

        let Some(top) = points.first() else {
            return Ok((None, Some(embedding)));
        };

        if top.score < self.config.similarity_threshold {
            debug!(
                "Semantic score below threshold: {:.4} < {}",
                top.score, self.config.similarity_threshold
            );
            return Ok((None, Some(embedding)));
        }

        let payload = payload_to_json(&top.payload);
        let hit = SemanticHit {
            answer: payload
                .get("answer")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            doc_ids: payload
                .get("doc_ids")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            score: top.score,
            cached_question: payload
                .get("question")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        };

        if self.config.validate_relevance
            && !validate_doc_relevance(question, &hit.doc_ids, self.config.relevance_threshold)
        {
            info!(
                "Semantic cache hit rejected: score {:.4} passed but docs failed relevance",
                hit.score
            );
            return Ok((None, Some(embedding)));
        }

        Ok((Some(hit), Some(embedding)))
    }

    /// Insert a question/answer point. Best-effort; failures are logged.
    pub async fn store(
        &self,
        question: &str,
        answer: &str,
        doc_ids: &[String],
        embedding: Vec<f32>,
        translated_query: Option<&str>,
    ) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self
            .store_inner(question, answer, doc_ids, embedding, translated_query)
            .await
        {
            warn!("Semantic cache store failed: {}", e);
        }
    }

    async fn store_inner(
        &self,
        question: &str,
        answer: &str,
        doc_ids: &[String],
        embedding: Vec<f32>,
        translated_query: Option<&str>,
    ) -> Result<()> {
        self.ensure_collection().await?;

        let mut payload = json!({
            "question": question,
            "answer": answer,
            "doc_ids": doc_ids,
            "timestamp": Utc::now().timestamp() as f64,
        });
        if let Some(translated) = translated_query {
            payload["translated_query"] = json!(translated);
        }

        let point = PointStruct::new(
            Uuid::new_v4().to_string(),
            embedding,
            json_to_payload(&payload),
        );

        self.vector_store.upsert(&self.collection, vec![point]).await?;
        debug!("Stored question in semantic cache");
        Ok(())
    }

    /// Sweep expired points every `cleanup_interval` lookups.
    async fn maybe_cleanup(&self) {
        if self.config.cleanup_interval == 0 {
            return;
        }
        let count = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.config.cleanup_interval != 0 {
            return;
        }
        self.cleanup_expired().await;
    }

    pub async fn cleanup_expired(&self) {
        let cutoff = Utc::now().timestamp() as f64 - self.config.ttl_seconds as f64;
        match self
            .vector_store
            .delete_older_than(&self.collection, cutoff)
            .await
        {
            Ok(()) => info!("Cleaned up expired semantic cache entries"),
            Err(e) => warn!("Semantic cache cleanup failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_accepts_overlapping_docs() {
        let docs = vec!["Use settings>security to change your password".to_string()];
        assert!(validate_doc_relevance(
            "I forgot my password, help",
            &docs,
            0.3
        ));
    }

    #[test]
    fn test_relevance_rejects_unrelated_docs() {
        let docs = vec!["Shipping takes 3-5 business days".to_string()];
        assert!(!validate_doc_relevance(
            "I forgot my password, help",
            &docs,
            0.3
        ));
    }

    #[test]
    fn test_relevance_empty_docs_is_miss() {
        assert!(!validate_doc_relevance("anything", &[], 0.3));
    }

    #[test]
    fn test_relevance_no_keywords_does_not_filter() {
        // All tokens are short or stop words; nothing to validate against
        let docs = vec!["whatever".to_string()];
        assert!(validate_doc_relevance("how is it", &docs, 0.3));
    }
}
