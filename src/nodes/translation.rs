// src/nodes/translation.rs
// Query translation into English for unified search and comparison

use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::TranslatorClient;
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub struct QueryTranslationNode {
    translator: Arc<TranslatorClient>,
    input: InputContract,
    output: OutputContract,
}

impl QueryTranslationNode {
    pub fn new(translator: Arc<TranslatorClient>) -> Self {
        Self {
            translator,
            input: InputContract::new(
                [Field::Question],
                [Field::DetectedLanguage, Field::AggregatedQuery],
            ),
            output: OutputContract::new([Field::TranslatedQuery], []),
        }
    }
}

#[async_trait]
impl PipelineNode for QueryTranslationNode {
    fn name(&self) -> &'static str {
        "query_translation"
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
        // The aggregated query carries resolved references, prefer it
        let query = state
            .get_str(Field::AggregatedQuery)
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| state.question());

        // translate_lossy falls back to the input text on backend failure
        let translated = match state.get_str(Field::DetectedLanguage) {
            Some("en") => query.to_string(),
            _ => self.translator.translate_lossy(query, "en").await,
        };

        Ok(StateBag::new().with(Field::TranslatedQuery, translated))
    }
}
