// src/nodes/check_cache.rs
// Exact-match cache lookup (Tier A)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::cache::{normalize, ResponseCache};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct CheckCacheNode {
    cache: Arc<ResponseCache>,
    input: InputContract,
    output: OutputContract,
}

impl CheckCacheNode {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self {
            cache,
            input: InputContract::new([Field::Question], []),
            output: OutputContract::new(
                [Field::CacheHit, Field::CacheKey],
                [
                    Field::Answer,
                    Field::Confidence,
                    Field::Docs,
                    Field::CacheReason,
                ],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for CheckCacheNode {
    fn name(&self) -> &'static str {
        "check_cache"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    // Cache failures must never fail the request; a broken cache is a miss.
    fn best_effort(&self) -> bool {
        true
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let question = state.question();
        if question.is_empty() {
            return Ok(StateBag::new()
                .with(Field::CacheHit, false)
                .with(Field::CacheKey, ""));
        }

        let cache_key = normalize(question);
        let mut out = StateBag::new().with(Field::CacheKey, &cache_key);

        match self.cache.get(&cache_key).await {
            Some(entry) => {
                info!("Exact cache HIT for '{}'", question);
                self.cache.metrics().record_hit();
                out.set(Field::CacheHit, true);
                out.set(Field::Answer, entry.answer);
                // An exact normalized match is treated as fully confident
                out.set(Field::Confidence, 1.0f32);
                out.set(Field::Docs, entry.doc_ids);
                out.set(Field::CacheReason, "exact_match");
            }
            None => {
                out.set(Field::CacheHit, false);
            }
        }

        Ok(out)
    }
}
