// src/nodes/cache_similarity.rs
// Semantic cache lookup (Tier B), runs only on a Tier-A miss

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cache::{ResponseCache, SemanticCache};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct CacheSimilarityNode {
    semantic: Arc<SemanticCache>,
    exact: Arc<ResponseCache>,
    input: InputContract,
    output: OutputContract,
}

impl CacheSimilarityNode {
    pub fn new(semantic: Arc<SemanticCache>, exact: Arc<ResponseCache>) -> Self {
        Self {
            semantic,
            exact,
            input: InputContract::new(
                [Field::Question],
                [Field::TranslatedQuery, Field::CacheHit],
            ),
            output: OutputContract::new(
                [Field::CacheHit],
                [
                    Field::Answer,
                    Field::Confidence,
                    Field::Docs,
                    Field::CacheReason,
                    Field::QuestionEmbedding,
                ],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for CacheSimilarityNode {
    fn name(&self) -> &'static str {
        "cache_similarity"
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
        // Exact tier already answered
        if state.cache_hit() {
            return Ok(StateBag::new());
        }

        let question = state.question();
        if question.is_empty() {
            return Ok(StateBag::new().with(Field::CacheHit, false));
        }

        let translated = state.get_str(Field::TranslatedQuery);
        let (hit, embedding) = self.semantic.lookup(question, translated).await;

        let mut out = StateBag::new();
        // Keep the embedding for the store node so it is computed once
        if let Some(embedding) = embedding {
            out.set(Field::QuestionEmbedding, embedding);
        }

        match hit {
            Some(hit) => {
                info!(
                    "Semantic cache HIT for '{}' (score {:.4})",
                    question, hit.score
                );
                self.exact.metrics().record_semantic_hit();
                out.set(Field::CacheHit, true);
                out.set(Field::Answer, hit.answer);
                out.set(Field::Confidence, hit.score);
                out.set(Field::Docs, hit.doc_ids);
                out.set(
                    Field::CacheReason,
                    format!("semantic_match ({:.2})", hit.score),
                );
            }
            None => {
                self.exact.metrics().record_miss();
                out.set(Field::CacheHit, false);
            }
        }

        Ok(out)
    }
}
