// src/nodes/clarification.rs
// Clarification sub-dialogue node

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialog::{ClarificationEngine, DialogState};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};
use crate::session::{ClarificationContext, SessionStore};

pub struct ClarificationNode {
    engine: Arc<ClarificationEngine>,
    sessions: Arc<SessionStore>,
    input: InputContract,
    output: OutputContract,
}

impl ClarificationNode {
    pub fn new(engine: Arc<ClarificationEngine>, sessions: Arc<SessionStore>) -> Self {
        Self {
            engine,
            sessions,
            input: InputContract::new(
                [Field::ConversationHistory],
                [
                    Field::Question,
                    Field::BestDocMetadata,
                    Field::ClarificationContext,
                    Field::DetectedLanguage,
                    Field::DialogState,
                    Field::UserId,
                    Field::SessionId,
                ],
            ),
            output: OutputContract::new(
                [Field::Answer, Field::ClarificationContext],
                [Field::DialogState],
            ),
        }
    }

    async fn persist(&self, state: &StateBag, context: &ClarificationContext, dialog: DialogState) {
        if let (Some(user_id), Some(session_id)) = (
            state.get_str(Field::UserId),
            state.get_str(Field::SessionId),
        ) {
            let context = context.clone();
            self.sessions
                .update(user_id, session_id, move |session| {
                    session.clarification_context = Some(context.clone());
                    session.dialog_state = dialog;
                    if !context.active {
                        if let Some(doc_id) = &context.original_doc_id {
                            if !session.clarified_doc_ids.contains(doc_id) {
                                session.clarified_doc_ids.push(doc_id.clone());
                            }
                        }
                    }
                })
                .await;
        }
    }
}

#[async_trait]
impl PipelineNode for ClarificationNode {
    fn name(&self) -> &'static str {
        "clarification"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let context: ClarificationContext =
            state.get_as(Field::ClarificationContext).unwrap_or_default();

        let step = if context.active {
            // Loop mode: the user's latest message answers the pending question
            self.engine.advance(context, state.question()).await
        } else {
            let metadata = state
                .get(Field::BestDocMetadata)
                .cloned()
                .unwrap_or(serde_json::Value::Null);

            if metadata
                .get("clarifying_questions")
                .and_then(|v| v.as_array())
                .map(|arr| arr.is_empty())
                .unwrap_or(true)
            {
                // Nothing to clarify; pass through untouched
                return Ok(StateBag::new()
                    .with(Field::Answer, "")
                    .with(Field::ClarificationContext, ClarificationContext::default()));
            }

            let language = state.get_str(Field::DetectedLanguage).unwrap_or("en");
            let external_state: Option<DialogState> = state.get_as(Field::DialogState);
            self.engine
                .initialize(&metadata, language, external_state)
                .await
        };

        self.persist(state, &step.context, step.dialog_state).await;

        Ok(StateBag::new()
            .with(Field::Answer, step.answer)
            .with(Field::ClarificationContext, step.context)
            .with(Field::DialogState, step.dialog_state))
    }
}
