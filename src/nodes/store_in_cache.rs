// src/nodes/store_in_cache.rs
// Store the generated answer in both cache tiers after a miss

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cache::{CacheEntry, ResponseCache, SemanticCache};
use crate::clients::EmbeddingClient;
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct StoreInCacheNode {
    exact: Arc<ResponseCache>,
    semantic: Arc<SemanticCache>,
    embeddings: Arc<EmbeddingClient>,
    input: InputContract,
    output: OutputContract,
}

impl StoreInCacheNode {
    pub fn new(
        exact: Arc<ResponseCache>,
        semantic: Arc<SemanticCache>,
        embeddings: Arc<EmbeddingClient>,
    ) -> Self {
        Self {
            exact,
            semantic,
            embeddings,
            input: InputContract::new(
                [Field::Question, Field::Answer, Field::CacheKey],
                [
                    Field::Confidence,
                    Field::Docs,
                    Field::TranslatedQuery,
                    Field::QuestionEmbedding,
                    Field::CacheHit,
                ],
            ),
            output: OutputContract::new([], [Field::Cached]),
        }
    }
}

#[async_trait]
impl PipelineNode for StoreInCacheNode {
    fn name(&self) -> &'static str {
        "store_in_cache"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    fn best_effort(&self) -> bool {
        true
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        // Never re-cache a cache hit
        if state.cache_hit() {
            return Ok(StateBag::new());
        }

        let question = state.question();
        let answer = state.get_str(Field::Answer).unwrap_or_default();
        let cache_key = state.get_str(Field::CacheKey).unwrap_or_default();

        if question.is_empty() || answer.is_empty() || cache_key.is_empty() {
            return Ok(StateBag::new());
        }

        let confidence = state.confidence();
        let min_confidence = self.semantic.config().min_confidence_to_cache;
        if confidence < min_confidence {
            debug!(
                "Skipping cache store: confidence {:.2} < {}",
                confidence, min_confidence
            );
            return Ok(StateBag::new().with(Field::Cached, false));
        }

        let doc_ids = state.docs();

        let entry = CacheEntry::new(
            cache_key.to_string(),
            question.to_string(),
            answer.to_string(),
            doc_ids.clone(),
            confidence,
        );
        let stored = self.exact.set(cache_key, entry).await;
        info!("Cached answer for '{}'", question);

        // Reuse the embedding computed during the lookup phase when possible
        let embedding = match state.question_embedding() {
            Some(embedding) => Some(embedding),
            None => self.embeddings.embed(question, true).await.ok(),
        };

        match embedding {
            Some(embedding) => {
                self.semantic
                    .store(
                        question,
                        answer,
                        &doc_ids,
                        embedding,
                        state.get_str(Field::TranslatedQuery),
                    )
                    .await;
            }
            None => debug!("No embedding available, skipping semantic store"),
        }

        Ok(StateBag::new().with(Field::Cached, stored))
    }
}
