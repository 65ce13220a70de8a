// src/nodes/hybrid_search.rs
// Hybrid retrieval with probe short-circuit, expansion, and reranking

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};
use crate::retrieval::HybridRetriever;

pub struct HybridSearchNode {
    retriever: Arc<HybridRetriever>,
    input: InputContract,
    output: OutputContract,
}

impl HybridSearchNode {
    pub fn new(retriever: Arc<HybridRetriever>) -> Self {
        Self {
            retriever,
            input: InputContract::new(
                [],
                [
                    Field::Question,
                    Field::AggregatedQuery,
                    Field::TranslatedQuery,
                    Field::MatchedCategory,
                    Field::FilterUsed,
                ],
            ),
            output: OutputContract::new(
                [
                    Field::Docs,
                    Field::Scores,
                    Field::Confidence,
                    Field::BestDocMetadata,
                ],
                [Field::VectorResults],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for HybridSearchNode {
    fn name(&self) -> &'static str {
        "hybrid_search"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let query = state.effective_query();
        let filter_used = state.get_bool(Field::FilterUsed).unwrap_or(false);
        let category = if filter_used {
            state.get_string(Field::MatchedCategory)
        } else {
            None
        };

        let output = self
            .retriever
            .retrieve(query, category.as_deref(), true)
            .await;

        Ok(StateBag::new()
            .with(Field::Docs, &output.docs)
            .with(Field::Scores, &output.scores)
            .with(Field::Confidence, output.confidence)
            .with(Field::BestDocMetadata, &output.best_doc_metadata)
            .with(Field::VectorResults, &output.results))
    }
}
