// src/nodes/guardrails_input.rs
// Input guardrails stage, runs before any retrieval

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialog::DialogState;
use crate::error::PipelineResult;
use crate::guardrails::{Decision, GuardrailsEngine, BLOCKED_MESSAGE};
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct InputGuardrailsNode {
    engine: Arc<GuardrailsEngine>,
    input: InputContract,
    output: OutputContract,
}

impl InputGuardrailsNode {
    pub fn new(engine: Arc<GuardrailsEngine>) -> Self {
        Self {
            engine,
            input: InputContract::new([Field::Question], []),
            output: OutputContract::new(
                [
                    Field::GuardrailsBlocked,
                    Field::GuardrailsRiskScore,
                    Field::GuardrailsTriggered,
                ],
                [Field::Answer, Field::Question, Field::DialogState],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for InputGuardrailsNode {
    fn name(&self) -> &'static str {
        "input_guardrails"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let report = self.engine.scan(state.question());

        let mut out = StateBag::new()
            .with(Field::GuardrailsBlocked, report.blocked())
            .with(Field::GuardrailsRiskScore, report.risk_score)
            .with(Field::GuardrailsTriggered, &report.triggered);

        match report.decision {
            Decision::Block => {
                out.set(Field::Answer, BLOCKED_MESSAGE);
                out.set(Field::DialogState, DialogState::Blocked);
            }
            Decision::Sanitize(sanitized) => {
                out.set(Field::Question, sanitized);
            }
            Decision::Allow => {}
        }

        Ok(out)
    }
}
