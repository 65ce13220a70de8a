// src/dialog/clarification.rs
// Clarification sub-dialogue controller

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::clients::{ChatMessage, LlmClient};
use crate::dialog::state_machine::DialogState;
use crate::session::ClarificationContext;

/// Outcome of one clarification step.
#[derive(Debug, Clone)]
pub struct ClarificationStep {
    /// Question to send to the user; empty when the loop is finished.
    pub answer: String,
    pub context: ClarificationContext,
    pub dialog_state: DialogState,
}

/// Drives the per-document clarifying-question loop.
///
/// Initialization mode sets up the context from the selected document's
/// `clarifying_questions` metadata and emits the first question; loop mode
/// records the user's reply, advances the index, and either asks the next
/// question or deactivates the context so generation runs with the
/// collected answers.
pub struct ClarificationEngine {
    llm: Arc<LlmClient>,
}

impl ClarificationEngine {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn initialize(
        &self,
        best_doc_metadata: &Value,
        detected_language: &str,
        external_state: Option<DialogState>,
    ) -> ClarificationStep {
        let questions: Vec<String> = best_doc_metadata
            .get("clarifying_questions")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|q| q.as_str().map(|s| s.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        if questions.is_empty() {
            warn!("Clarification triggered but the document has no questions");
            return ClarificationStep {
                answer: String::new(),
                context: ClarificationContext::default(),
                dialog_state: DialogState::AnswerProvided,
            };
        }

        // An external override (blocked, escalation) wins over starting a loop
        if let Some(state) = external_state {
            if !matches!(
                state,
                DialogState::AwaitingClarification | DialogState::Initial
            ) {
                return ClarificationStep {
                    answer: String::new(),
                    context: ClarificationContext::default(),
                    dialog_state: state,
                };
            }
        }

        let context = ClarificationContext {
            active: true,
            questions: questions.clone(),
            current_index: 0,
            answers: serde_json::Map::new(),
            original_doc_id: best_doc_metadata
                .get("id")
                .map(|v| v.to_string().trim_matches('"').to_string()),
            requires_handoff: best_doc_metadata
                .get("requires_handoff")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            target_language: detected_language.to_string(),
        };

        info!("Starting clarification loop with {} questions", questions.len());

        let first = self
            .translate_question(&questions[0], &context.target_language)
            .await;

        ClarificationStep {
            answer: first,
            context,
            dialog_state: DialogState::AwaitingClarification,
        }
    }

    pub async fn advance(
        &self,
        mut context: ClarificationContext,
        user_message: &str,
    ) -> ClarificationStep {
        if context.current_index < context.questions.len() {
            let question = context.questions[context.current_index].clone();
            context
                .answers
                .insert(question, Value::String(user_message.to_string()));
        }

        context.current_index += 1;

        if context.current_index >= context.questions.len() {
            info!("Clarification loop complete");
            context.active = false;
            // Empty answer signals the graph to continue to generation,
            // which reads the collected answers from the context.
            return ClarificationStep {
                answer: String::new(),
                context,
                dialog_state: DialogState::AnswerProvided,
            };
        }

        let next = context.questions[context.current_index].clone();
        let translated = self
            .translate_question(&next, &context.target_language.clone())
            .await;

        ClarificationStep {
            answer: translated,
            context,
            dialog_state: DialogState::AwaitingClarification,
        }
    }

    /// Clarifying questions are authored in the document language; render
    /// them in the user's language. Falls back to the original on failure.
    async fn translate_question(&self, question: &str, target_lang: &str) -> String {
        let target = target_lang.to_lowercase();
        if target.is_empty() || target == "en" || target == "english" || target == "unknown" {
            return question.to_string();
        }

        let messages = [
            ChatMessage::system(
                "Translate the following support question into the requested language. \
                 Keep the tone professional and friendly. \
                 Do not add any preamble or quotes.",
            ),
            ChatMessage::user(format!("Language: {}\nQuestion: {}", target, question)),
        ];

        match self.llm.chat(&messages, Some(0.0), false).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("Clarification translation failed: {}", e);
                question.to_string()
            }
        }
    }
}
