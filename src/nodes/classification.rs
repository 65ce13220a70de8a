// src/nodes/classification.rs
// Intent/category classification over fixed label sets

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::warn;

use crate::clients::{ChatMessage, LlmClient};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};

pub const INTENTS: &[&str] = &[
    "reset_password",
    "view_history",
    "contact_support",
    "check_policy",
    "change_address",
    "check_shipping_availability",
    "track_order",
    "check_payment_methods",
    "cancel_subscription",
    "company_info",
];

pub const CATEGORIES: &[&str] = &[
    "Account Access",
    "Order Management",
    "Support",
    "Returns & Refunds",
    "Shipping",
    "Billing",
    "Account Management",
    "General Info",
];

const CACHE_CAP: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
struct ClassificationOutput {
    intent: String,
    category: String,
    #[serde(default)]
    confidence: f32,
}

/// Zero-shot classification via the LLM in JSON mode, with a small
/// in-process result cache keyed by the exact question text.
pub struct ClassificationNode {
    llm: Arc<LlmClient>,
    cache: Mutex<HashMap<String, ClassificationOutput>>,
    input: InputContract,
    output: OutputContract,
}

impl ClassificationNode {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self {
            llm,
            cache: Mutex::new(HashMap::new()),
            input: InputContract::new([Field::Question], [Field::TranslatedQuery]),
            output: OutputContract::new(
                [
                    Field::MatchedCategory,
                    Field::MatchedIntent,
                    Field::ClassificationConfidence,
                ],
                [],
            ),
        }
    }

    async fn classify(&self, text: &str) -> Option<ClassificationOutput> {
        if let Some(cached) = self.cache.lock().get(text).cloned() {
            return Some(cached);
        }

        let system = format!(
            "Classify the support question. Pick exactly one intent from {:?} and one category \
             from {:?}. Respond with JSON: \
             {{\"intent\": ..., \"category\": ..., \"confidence\": 0.0-1.0}}",
            INTENTS, CATEGORIES
        );
        let messages = [ChatMessage::system(system), ChatMessage::user(text)];

        let raw = match self.llm.chat(&messages, Some(0.0), true).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Classification call failed: {}", e);
                return None;
            }
        };

        let parsed: ClassificationOutput = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unparseable classification output: {}", e);
                return None;
            }
        };

        let mut cache = self.cache.lock();
        if cache.len() >= CACHE_CAP {
            // Drop an arbitrary entry to stay bounded
            if let Some(key) = cache.keys().next().cloned() {
                cache.remove(&key);
            }
        }
        cache.insert(text.to_string(), parsed.clone());

        Some(parsed)
    }
}

#[async_trait]
impl PipelineNode for ClassificationNode {
    fn name(&self) -> &'static str {
        "classification"
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
        let text = state
            .get_str(Field::TranslatedQuery)
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| state.question());

        match self.classify(text).await {
            Some(result) => Ok(StateBag::new()
                .with(Field::MatchedCategory, result.category)
                .with(Field::MatchedIntent, result.intent)
                .with(Field::ClassificationConfidence, result.confidence)),
            None => Ok(StateBag::new()
                .with(Field::MatchedCategory, "")
                .with(Field::MatchedIntent, "")
                .with(Field::ClassificationConfidence, 0.0f32)),
        }
    }
}
