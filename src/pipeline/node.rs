// src/pipeline/node.rs
// Node trait and the contract-enforcing dispatch wrapper

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn, Instrument};

use crate::config::ValidationConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::contract::{InputContract, OutputContract};
use crate::pipeline::state::StateBag;

/// One stage of the RAG pipeline.
///
/// `execute` receives a contract-filtered view of the request state and
/// returns ONLY the fields it produces; the graph merges the result into the
/// caller's bag. Returning the whole state bloats traces and leaks fields
/// across sibling nodes.
#[async_trait]
pub trait PipelineNode: Send + Sync {
    fn name(&self) -> &'static str;

    fn input_contract(&self) -> &InputContract;

    fn output_contract(&self) -> &OutputContract;

    /// Best-effort nodes degrade on failure instead of failing the request.
    fn best_effort(&self) -> bool {
        false
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag>;
}

/// Dispatch wrapper applied to every node invocation: input filtering,
/// tracing span, timeout, retries, output validation.
#[derive(Clone)]
pub struct NodeRuntime {
    validation: ValidationConfig,
}

impl NodeRuntime {
    pub fn new(validation: ValidationConfig) -> Self {
        Self { validation }
    }

    pub async fn dispatch(
        &self,
        node: &Arc<dyn PipelineNode>,
        state: &StateBag,
        timeout_ms: u64,
        retry_count: u32,
    ) -> PipelineResult<StateBag> {
        let input = self.filter_input(node, state)?;

        let span = tracing::info_span!("pipeline_node", node = node.name());
        async {
            let output = self
                .execute_with_retries(node, &input, timeout_ms, retry_count)
                .await?;
            self.validate_output(node, output)
        }
        .instrument(span)
        .await
    }

    fn filter_input(
        &self,
        node: &Arc<dyn PipelineNode>,
        state: &StateBag,
    ) -> PipelineResult<StateBag> {
        let contract = node.input_contract();

        if !self.validation.enabled || !self.validation.filter_inputs || contract.is_empty() {
            return Ok(state.clone());
        }

        if self.validation.strict_required_inputs {
            for field in contract.required() {
                if !state.has(*field) {
                    return Err(PipelineError::MissingRequiredInput {
                        node: node.name().to_string(),
                        field: field.to_string(),
                    });
                }
            }
        }

        let filtered = state.filtered(contract.all_fields());
        if self.validation.log_filtering {
            let removed = state.len().saturating_sub(filtered.len());
            if removed > 0 {
                debug!("[{}] input filter removed {} fields", node.name(), removed);
            }
        }
        Ok(filtered)
    }

    async fn execute_with_retries(
        &self,
        node: &Arc<dyn PipelineNode>,
        input: &StateBag,
        timeout_ms: u64,
        retry_count: u32,
    ) -> PipelineResult<StateBag> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result =
                match tokio::time::timeout(Duration::from_millis(timeout_ms), node.execute(input))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::Timeout {
                        node: node.name().to_string(),
                        timeout_ms,
                    }),
                };

            match result {
                Ok(output) => return Ok(output),
                Err(e) if attempt < retry_count && is_retryable(&e) => {
                    warn!(
                        "[{}] attempt {}/{} failed, retrying: {}",
                        node.name(),
                        attempt,
                        retry_count,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Strip undeclared output fields and log contract violations.
    /// Guaranteed fields that are missing are logged but never fabricated.
    /// Violations are non-fatal unless strict mode is on.
    fn validate_output(
        &self,
        node: &Arc<dyn PipelineNode>,
        output: StateBag,
    ) -> PipelineResult<StateBag> {
        let contract = node.output_contract();

        if !self.validation.enabled || contract.is_empty() {
            return Ok(output);
        }

        for field in contract.guaranteed() {
            if !output.has(*field) && self.validation.log_violations {
                warn!(
                    "[{}] contract violation: guaranteed field '{}' missing from output",
                    node.name(),
                    field
                );
            }
        }

        let undeclared: Vec<_> = output
            .fields()
            .filter(|f| !contract.all_fields().contains(f))
            .collect();

        if undeclared.is_empty() {
            return Ok(output);
        }

        if self.validation.strict_mode {
            return Err(PipelineError::ContractViolation {
                node: node.name().to_string(),
                field: undeclared[0].to_string(),
            });
        }

        if self.validation.log_violations {
            for field in &undeclared {
                warn!(
                    "[{}] contract violation: output field '{}' not in contract",
                    node.name(),
                    field
                );
            }
        }

        if self.validation.filter_outputs {
            Ok(output.filtered(contract.all_fields()))
        } else {
            Ok(output)
        }
    }
}

fn is_retryable(error: &PipelineError) -> bool {
    matches!(
        error,
        PipelineError::Timeout { .. } | PipelineError::BackendUnavailable { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::field::Field;

    struct EchoNode {
        input: InputContract,
        output: OutputContract,
        extra_output: bool,
    }

    #[async_trait]
    impl PipelineNode for EchoNode {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn input_contract(&self) -> &InputContract {
            &self.input
        }

        fn output_contract(&self) -> &OutputContract {
            &self.output
        }

        async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
            // Leaks an undeclared field when asked, to exercise validation
            let mut out = StateBag::new().with(Field::Answer, state.question().to_uppercase());
            if self.extra_output {
                out.set(Field::Confidence, 0.5);
            }
            if self.input.all_fields().contains(&Field::SessionId) {
                assert!(
                    !state.has(Field::UserId),
                    "input filter must drop undeclared fields"
                );
            }
            Ok(out)
        }
    }

    fn echo(extra_output: bool) -> Arc<dyn PipelineNode> {
        Arc::new(EchoNode {
            input: InputContract::new([Field::Question], [Field::SessionId]),
            output: OutputContract::new([Field::Answer], []),
            extra_output,
        })
    }

    #[tokio::test]
    async fn test_undeclared_output_fields_are_stripped() {
        let runtime = NodeRuntime::new(ValidationConfig::strict());
        let state = StateBag::new()
            .with(Field::Question, "hello")
            .with(Field::UserId, "u1");

        let out = runtime.dispatch(&echo(true), &state, 1000, 1).await.unwrap();
        assert_eq!(out.get_str(Field::Answer), Some("HELLO"));
        assert!(!out.has(Field::Confidence), "undeclared field must be removed");
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_missing_required_input() {
        let runtime = NodeRuntime::new(ValidationConfig::strict());
        let state = StateBag::new().with(Field::UserId, "u1");

        let err = runtime.dispatch(&echo(false), &state, 1000, 1).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingRequiredInput { .. }));
    }

    #[tokio::test]
    async fn test_strict_mode_makes_violations_fatal() {
        let mut config = ValidationConfig::strict();
        config.strict_mode = true;
        let runtime = NodeRuntime::new(config);
        let state = StateBag::new().with(Field::Question, "hello");

        let err = runtime.dispatch(&echo(true), &state, 1000, 1).await.unwrap_err();
        assert!(matches!(err, PipelineError::ContractViolation { .. }));
    }

    #[tokio::test]
    async fn test_disabled_validation_is_pass_through() {
        let runtime = NodeRuntime::new(ValidationConfig::disabled());
        let state = StateBag::new().with(Field::Question, "hello");

        let out = runtime.dispatch(&echo(true), &state, 1000, 1).await.unwrap();
        assert!(out.has(Field::Confidence), "pass-through keeps all outputs");
    }
}
