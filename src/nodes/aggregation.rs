// src/nodes/aggregation.rs
// Query aggregation: fold prior turns into a self-contained query

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::clients::{ChatMessage, LlmClient};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

const AGGREGATION_SYSTEM_PROMPT: &str = "You rewrite the user's latest support question so it is \
self-contained: resolve pronouns and references against the conversation history and fill in \
omitted details the history makes explicit. Keep the original language. If the question is \
already self-contained, return it unchanged. Return only the rewritten question.";

/// Turns "and what about the second one?" into a standalone question by
/// resolving co-references against recent history.
pub struct QueryAggregationNode {
    llm: Arc<LlmClient>,
    input: InputContract,
    output: OutputContract,
    history_window: usize,
}

impl QueryAggregationNode {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self {
            llm,
            input: InputContract::new([Field::Question], [Field::ConversationHistory]),
            output: OutputContract::new([Field::AggregatedQuery], []),
            history_window: 6,
        }
    }
}

#[async_trait]
impl PipelineNode for QueryAggregationNode {
    fn name(&self) -> &'static str {
        "query_aggregation"
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
        let history = state.history();

        if history.is_empty() {
            return Ok(StateBag::new().with(Field::AggregatedQuery, question));
        }

        let recent: Vec<String> = history
            .iter()
            .rev()
            .take(self.history_window)
            .rev()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect();

        let user_prompt = format!(
            "History:\n{}\n\nLatest question: {}",
            recent.join("\n"),
            question
        );

        let messages = [
            ChatMessage::system(AGGREGATION_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ];

        let aggregated = match self.llm.chat(&messages, Some(0.0), false).await {
            Ok(rewritten) if !rewritten.is_empty() => rewritten,
            Ok(_) => question.to_string(),
            Err(e) => {
                warn!("Query aggregation failed, using original question: {}", e);
                question.to_string()
            }
        };

        Ok(StateBag::new().with(Field::AggregatedQuery, aggregated))
    }
}
