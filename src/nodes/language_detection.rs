// src/nodes/language_detection.rs
// Detect the user's language for translation and clarification rendering

use async_trait::async_trait;

use crate::clients::translator::{detect_language, normalize_lang};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct LanguageDetectionNode {
    input: InputContract,
    output: OutputContract,
}

impl LanguageDetectionNode {
    pub fn new() -> Self {
        Self {
            input: InputContract::new([Field::Question], []),
            output: OutputContract::new([Field::DetectedLanguage], []),
        }
    }
}

impl Default for LanguageDetectionNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineNode for LanguageDetectionNode {
    fn name(&self) -> &'static str {
        "language_detection"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let detected = normalize_lang(detect_language(state.question()));
        Ok(StateBag::new().with(Field::DetectedLanguage, detected))
    }
}
