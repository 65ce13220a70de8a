// src/nodes/generation.rs
// Answer generation from the assembled context

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{PipelineError, PipelineResult};
use crate::generation::Generator;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};
use crate::session::ClarificationContext;

pub struct GenerationNode {
    generator: Arc<Generator>,
    input: InputContract,
    output: OutputContract,
}

impl GenerationNode {
    pub fn new(generator: Arc<Generator>) -> Self {
        Self {
            generator,
            input: InputContract::new(
                [],
                [
                    Field::Question,
                    Field::AggregatedQuery,
                    Field::Docs,
                    Field::MergedContext,
                    Field::SystemPrompt,
                    Field::HumanPrompt,
                    Field::EscalationMessage,
                    Field::ClarificationContext,
                    Field::BestDocMetadata,
                ],
            ),
            output: OutputContract::new([Field::Answer], [Field::Sources]),
        }
    }
}

#[async_trait]
impl PipelineNode for GenerationNode {
    fn name(&self) -> &'static str {
        "generation"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        // Escalations bypass the model entirely
        if let Some(message) = state
            .get_str(Field::EscalationMessage)
            .filter(|m| !m.is_empty())
        {
            return Ok(StateBag::new().with(Field::Answer, message));
        }

        let question = state
            .get_str(Field::AggregatedQuery)
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| state.question());

        // Multi-hop merged context replaces the raw doc list when present
        let docs = match state
            .get_str(Field::MergedContext)
            .filter(|c| !c.is_empty())
        {
            Some(merged) => vec![merged.to_string()],
            None => state.docs(),
        };

        let clarification: Option<ClarificationContext> =
            state.get_as(Field::ClarificationContext);

        let answer = self
            .generator
            .generate(
                question,
                &docs,
                state.get_str(Field::SystemPrompt),
                state.get_str(Field::HumanPrompt),
                clarification.as_ref().filter(|c| !c.answers.is_empty()),
            )
            .await
            .map_err(|e| PipelineError::backend("llm", e))?;

        let mut out = StateBag::new().with(Field::Answer, answer);
        if let Some(metadata) = state.get(Field::BestDocMetadata) {
            if !metadata.is_null() {
                out.set(Field::Sources, json!([metadata]));
            }
        }
        Ok(out)
    }
}
