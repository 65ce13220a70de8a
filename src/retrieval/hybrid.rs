// src/retrieval/hybrid.rs
// Hybrid retrieval: parallel dense + lexical with RRF, probe short-circuit,
// expansion fan-out, optional cross-encoder reranking

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::clients::{EmbeddingClient, RerankerClient, VectorStore};
use crate::config::retrieval::RetrievalConfig;
use crate::db::DocumentRepository;

use super::dense::vector_search;
use super::expansion::QueryExpander;
use super::fusion::reciprocal_rank_fusion;
use super::types::{RetrievalOutput, SearchResult};

pub struct HybridRetriever {
    vector_store: Arc<VectorStore>,
    documents: DocumentRepository,
    embeddings: Arc<EmbeddingClient>,
    reranker: Arc<RerankerClient>,
    expander: QueryExpander,
    config: RetrievalConfig,
    collection: String,
}

impl HybridRetriever {
    pub fn new(
        vector_store: Arc<VectorStore>,
        documents: DocumentRepository,
        embeddings: Arc<EmbeddingClient>,
        reranker: Arc<RerankerClient>,
        expander: QueryExpander,
        config: RetrievalConfig,
        collection: String,
    ) -> Self {
        Self {
            vector_store,
            documents,
            embeddings,
            reranker,
            expander,
            config,
            collection,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Dense-only search for one query; used by the probe pass and the
    /// `/search` endpoint.
    pub async fn dense_search(
        &self,
        query: &str,
        top_k: u64,
        category_filter: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let embedding = self.embeddings.embed(query, true).await?;
        Ok(vector_search(
            &self.vector_store,
            &self.documents,
            &self.collection,
            embedding,
            top_k,
            category_filter,
        )
        .await)
    }

    /// One hybrid pass: dense and lexical legs in parallel, fused with RRF.
    /// Either leg may fail independently; the other still contributes.
    pub async fn search_hybrid(
        &self,
        query: &str,
        top_k: usize,
        category_filter: Option<&str>,
    ) -> Vec<SearchResult> {
        let candidate_k = (top_k * self.config.candidate_multiplier) as u64;

        let dense_leg = async {
            match self.embeddings.embed(query, true).await {
                Ok(embedding) => {
                    vector_search(
                        &self.vector_store,
                        &self.documents,
                        &self.collection,
                        embedding,
                        candidate_k,
                        category_filter,
                    )
                    .await
                }
                Err(e) => {
                    warn!("Dense leg degraded to empty: {}", e);
                    Vec::new()
                }
            }
        };

        let lexical_leg = async {
            self.documents
                .lexical_search(
                    query,
                    candidate_k as i64,
                    &self.config.document_language,
                    category_filter,
                )
                .await
                .unwrap_or_else(|e| {
                    warn!("Lexical leg degraded to empty: {}", e);
                    Vec::new()
                })
        };

        let (dense_results, lexical_results) = tokio::join!(dense_leg, lexical_leg);
        reciprocal_rank_fusion(&[dense_results, lexical_results], top_k)
    }

    /// Fan out hybrid searches over several candidate queries and merge,
    /// deduplicating by content and keeping the best fused score order.
    pub async fn search_fan_out(
        &self,
        queries: &[String],
        top_k: usize,
        category_filter: Option<&str>,
    ) -> Vec<SearchResult> {
        let tasks = queries
            .iter()
            .map(|q| self.search_hybrid(q, top_k, category_filter));
        let all_results = join_all(tasks).await;

        let mut seen = std::collections::HashSet::new();
        let mut unique: Vec<SearchResult> = Vec::new();
        for results in all_results {
            for result in results {
                if seen.insert(result.content.clone()) {
                    unique.push(result);
                }
            }
        }

        unique.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        unique.truncate(top_k);
        unique
    }

    /// Full retrieval pass with the short-circuit:
    ///
    /// 1. Probe with the original query. A confident top score skips
    ///    expansion and reranking entirely.
    /// 2. Otherwise expand the query, fan out hybrid searches, and
    ///    optionally rerank the merged candidates with the cross-encoder.
    pub async fn retrieve(
        &self,
        query: &str,
        category_filter: Option<&str>,
        use_expansion: bool,
    ) -> RetrievalOutput {
        let top_k = self.config.final_top_k;

        let probe = self.search_hybrid(query, top_k, category_filter).await;
        let probe_output = RetrievalOutput::from_results(probe);

        if probe_output.confidence >= self.config.confidence_threshold {
            debug!(
                "Probe confident ({:.3} >= {}), skipping expansion and rerank",
                probe_output.confidence, self.config.confidence_threshold
            );
            return probe_output;
        }

        let queries = if use_expansion && self.config.use_expansion {
            self.expander.expand(query).await
        } else {
            vec![query.to_string()]
        };

        let candidates = self.search_fan_out(&queries, top_k, category_filter).await;

        match self.config.top_k_rerank {
            Some(keep) => self.rerank(query, candidates, keep).await,
            None => RetrievalOutput::from_results(candidates),
        }
    }

    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchResult>,
        keep: usize,
    ) -> RetrievalOutput {
        let docs: Vec<String> = candidates.iter().map(|r| r.content.clone()).collect();

        let ranked = match self.reranker.rank(query, &docs).await {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!("Reranking failed, keeping fused order: {}", e);
                return RetrievalOutput::from_results(candidates);
            }
        };

        let results: Vec<SearchResult> = ranked
            .into_iter()
            .take(keep)
            .map(|(score, content)| {
                let metadata = candidates
                    .iter()
                    .find(|r| r.content == content)
                    .map(|r| r.metadata.clone())
                    .unwrap_or(serde_json::Value::Null);
                SearchResult {
                    content,
                    score,
                    metadata,
                }
            })
            .collect();

        RetrievalOutput::from_results(results)
    }

    /// How many documents a filtered search would return; drives the
    /// metadata-filter fallback.
    pub async fn filtered_result_count(&self, query: &str, category: &str) -> usize {
        self.search_hybrid(query, self.config.final_top_k, Some(category))
            .await
            .len()
    }
}
