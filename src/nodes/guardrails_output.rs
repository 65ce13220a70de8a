// src/nodes/guardrails_output.rs
// Output guardrails stage, runs on the final answer

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::guardrails::{Decision, GuardrailsEngine, BLOCKED_MESSAGE};
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct OutputGuardrailsNode {
    engine: Arc<GuardrailsEngine>,
    input: InputContract,
    output: OutputContract,
}

impl OutputGuardrailsNode {
    pub fn new(engine: Arc<GuardrailsEngine>) -> Self {
        Self {
            engine,
            input: InputContract::new(
                [],
                [
                    Field::Answer,
                    Field::GuardrailsRiskScore,
                    Field::GuardrailsTriggered,
                ],
            ),
            output: OutputContract::new(
                [Field::Answer],
                [
                    Field::GuardrailsBlocked,
                    Field::GuardrailsRiskScore,
                    Field::GuardrailsTriggered,
                ],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for OutputGuardrailsNode {
    fn name(&self) -> &'static str {
        "output_guardrails"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let answer = state.get_str(Field::Answer).unwrap_or_default();
        if answer.is_empty() {
            return Ok(StateBag::new().with(Field::Answer, answer));
        }

        let report = self.engine.scan(answer);

        // Merge with whatever the input stage recorded
        let input_risk = state.get_f32(Field::GuardrailsRiskScore).unwrap_or(0.0);
        let mut triggered: Vec<String> = state.get_as(Field::GuardrailsTriggered).unwrap_or_default();
        for scanner in &report.triggered {
            let name = scanner.to_string();
            if !triggered.contains(&name) {
                triggered.push(name);
            }
        }

        let final_answer = match report.decision {
            Decision::Block => BLOCKED_MESSAGE.to_string(),
            Decision::Sanitize(ref sanitized) => sanitized.clone(),
            Decision::Allow => answer.to_string(),
        };

        Ok(StateBag::new()
            .with(Field::Answer, final_answer)
            .with(Field::GuardrailsBlocked, report.blocked())
            .with(Field::GuardrailsRiskScore, report.risk_score.max(input_risk))
            .with(Field::GuardrailsTriggered, triggered))
    }
}
