// src/nodes/multihop.rs
// Multi-hop context expansion for non-simple questions

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::PipelineResult;
use crate::multihop::{detect_complexity, ComplexityLevel, HopResolver};
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct MultihopNode {
    resolver: Arc<HopResolver>,
    input: InputContract,
    output: OutputContract,
}

impl MultihopNode {
    pub fn new(resolver: Arc<HopResolver>) -> Self {
        Self {
            resolver,
            input: InputContract::new(
                [Field::Question],
                [Field::Docs, Field::Scores, Field::BestDocMetadata],
            ),
            output: OutputContract::new(
                [
                    Field::ComplexityLevel,
                    Field::MultihopUsed,
                    Field::HopsPerformed,
                ],
                [Field::MergedContext],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for MultihopNode {
    fn name(&self) -> &'static str {
        "multihop"
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
        let question = state.question();
        let docs = state.docs();

        let complexity = detect_complexity(question);
        debug!(
            "Complexity: {:?} (score {:.1}), {} hops",
            complexity.level, complexity.score, complexity.num_hops
        );

        if complexity.level == ComplexityLevel::Simple || docs.is_empty() {
            let mut out = StateBag::new()
                .with(Field::ComplexityLevel, complexity.level)
                .with(Field::MultihopUsed, false)
                .with(Field::HopsPerformed, 1u32);
            if let Some(top) = docs.first() {
                out.set(Field::MergedContext, top);
            }
            return Ok(out);
        }

        let metadata = state
            .get(Field::BestDocMetadata)
            .cloned()
            .unwrap_or(Value::Null);

        let resolution = self
            .resolver
            .resolve(question, &docs[0], &metadata, complexity.num_hops)
            .await
            .map_err(crate::error::PipelineError::Internal)?;

        Ok(StateBag::new()
            .with(Field::ComplexityLevel, complexity.level)
            .with(Field::MultihopUsed, true)
            .with(Field::HopsPerformed, resolution.hops_performed)
            .with(Field::MergedContext, resolution.merged_context))
    }
}
