// src/nodes/metadata_filter.rs
// Decide whether retrieval should filter by the classified category

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};
use crate::retrieval::HybridRetriever;

pub struct MetadataFilterNode {
    retriever: Arc<HybridRetriever>,
    input: InputContract,
    output: OutputContract,
}

impl MetadataFilterNode {
    pub fn new(retriever: Arc<HybridRetriever>) -> Self {
        Self {
            retriever,
            input: InputContract::new(
                [],
                [
                    Field::MatchedCategory,
                    Field::ClassificationConfidence,
                    Field::Question,
                    Field::AggregatedQuery,
                    Field::TranslatedQuery,
                ],
            ),
            output: OutputContract::new([Field::FilterUsed, Field::FallbackTriggered], []),
        }
    }
}

#[async_trait]
impl PipelineNode for MetadataFilterNode {
    fn name(&self) -> &'static str {
        "metadata_filter"
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
        let config = self.retriever.config();

        let category = state
            .get_str(Field::MatchedCategory)
            .filter(|c| !c.is_empty());
        let confidence = state
            .get_f32(Field::ClassificationConfidence)
            .unwrap_or(0.0);

        let Some(category) = category else {
            return Ok(StateBag::new()
                .with(Field::FilterUsed, false)
                .with(Field::FallbackTriggered, false));
        };

        if confidence < config.filter_confidence_threshold {
            debug!(
                "Category filter skipped: confidence {:.2} < {}",
                confidence, config.filter_confidence_threshold
            );
            return Ok(StateBag::new()
                .with(Field::FilterUsed, false)
                .with(Field::FallbackTriggered, false));
        }

        // Safety check: a filter that starves retrieval is worse than none
        let hits = self
            .retriever
            .filtered_result_count(state.effective_query(), category)
            .await;

        if hits < config.filter_min_docs {
            info!(
                "Category filter fallback: '{}' matched only {} docs",
                category, hits
            );
            return Ok(StateBag::new()
                .with(Field::FilterUsed, false)
                .with(Field::FallbackTriggered, true));
        }

        Ok(StateBag::new()
            .with(Field::FilterUsed, true)
            .with(Field::FallbackTriggered, false))
    }
}
