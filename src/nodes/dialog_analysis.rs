// src/nodes/dialog_analysis.rs
// Dialog signal computation plus topic-loop detection

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialog::{analysis, TopicLoopDetector};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct DialogAnalysisNode {
    loop_detector: Arc<TopicLoopDetector>,
    input: InputContract,
    output: OutputContract,
}

impl DialogAnalysisNode {
    pub fn new(loop_detector: Arc<TopicLoopDetector>) -> Self {
        Self {
            loop_detector,
            input: InputContract::new(
                [Field::Question],
                [
                    Field::ConversationHistory,
                    Field::TranslatedQuery,
                    Field::DetectedLanguage,
                ],
            ),
            output: OutputContract::new(
                [Field::DialogAnalysis],
                [
                    Field::TopicLoopDetected,
                    Field::LoopConfidence,
                    Field::SimilarMessagesCount,
                ],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for DialogAnalysisNode {
    fn name(&self) -> &'static str {
        "dialog_analysis"
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

        let mut signals = analysis::analyze(question, &history);

        // The loop detector fails open internally
        let loop_result = self
            .loop_detector
            .detect(
                question,
                &history,
                state.get_str(Field::TranslatedQuery),
                state.get_str(Field::DetectedLanguage),
            )
            .await;

        // Semantic repetition feeds the same transition rule as a literal
        // re-send of the question
        signals.repeated_question = signals.repeated_question || loop_result.topic_loop_detected;

        Ok(StateBag::new()
            .with(Field::DialogAnalysis, &signals)
            .with(Field::TopicLoopDetected, loop_result.topic_loop_detected)
            .with(Field::LoopConfidence, loop_result.loop_confidence)
            .with(
                Field::SimilarMessagesCount,
                loop_result.similar_messages_count,
            ))
    }
}
