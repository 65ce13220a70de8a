// src/nodes/state_machine.rs
// Dialog state transition and session persistence

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::dialog::DialogConfig;
use crate::db::PersistenceRepository;
use crate::dialog::{transition, DialogAnalysis, DialogState};
use crate::error::PipelineResult;
use crate::pipeline::{Field, InputContract, OutputContract, PipelineNode, StateBag};
use crate::session::SessionStore;

/// Message handed to the user when the conversation escalates.
pub const ESCALATION_MESSAGE: &str =
    "Передаю ваш вопрос оператору поддержки. Пожалуйста, подождите.";

pub struct StateMachineNode {
    sessions: Arc<SessionStore>,
    persistence: PersistenceRepository,
    config: DialogConfig,
    input: InputContract,
    output: OutputContract,
}

impl StateMachineNode {
    pub fn new(
        sessions: Arc<SessionStore>,
        persistence: PersistenceRepository,
        config: DialogConfig,
    ) -> Self {
        Self {
            sessions,
            persistence,
            config,
            input: InputContract::new(
                [Field::DialogAnalysis],
                [
                    Field::UserId,
                    Field::SessionId,
                    Field::DialogState,
                    Field::AttemptCount,
                    Field::Question,
                ],
            ),
            output: OutputContract::new(
                [Field::DialogState, Field::AttemptCount, Field::Action],
                [Field::EscalationMessage],
            ),
        }
    }
}

#[async_trait]
impl PipelineNode for StateMachineNode {
    fn name(&self) -> &'static str {
        "state_machine"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, state: &StateBag) -> PipelineResult<StateBag> {
        let analysis: DialogAnalysis = state.get_as(Field::DialogAnalysis).unwrap_or_default();
        let current: DialogState = state.get_as(Field::DialogState).unwrap_or_default();
        let attempt_count = state.attempt_count();

        let result = transition(current, attempt_count, &analysis, &self.config);
        info!(
            "Dialog transition {} -> {} ({}), attempts {}",
            current.as_str(),
            result.state.as_str(),
            result.reason,
            result.attempt_count
        );

        let mut out = StateBag::new()
            .with(Field::DialogState, result.state)
            .with(Field::AttemptCount, result.attempt_count);

        if result.state.is_escalation() {
            out.set(Field::Action, "handoff");
            out.set(Field::EscalationMessage, ESCALATION_MESSAGE);
        } else {
            out.set(Field::Action, "auto_reply");
        }

        // Persist the transition; session write failures never fail the turn
        if let (Some(user_id), Some(session_id)) = (
            state.get_str(Field::UserId),
            state.get_str(Field::SessionId),
        ) {
            let new_state = result.state;
            let attempts = result.attempt_count;
            self.sessions
                .update(user_id, session_id, move |session| {
                    session.dialog_state = new_state;
                    session.attempt_count = attempts;
                })
                .await;

            if result.state.is_escalation() {
                if let Err(e) = self
                    .persistence
                    .record_escalation(
                        session_id,
                        user_id,
                        result.reason,
                        Some(state.question()),
                    )
                    .await
                {
                    warn!("Failed to record escalation: {}", e);
                }
            }

            if result.state == DialogState::Resolved {
                if let Err(e) = self
                    .persistence
                    .archive_session(
                        session_id,
                        user_id,
                        "resolved",
                        state.question(),
                        &serde_json::json!({"attempt_count": result.attempt_count}),
                        None,
                    )
                    .await
                {
                    warn!("Failed to archive resolved session: {}", e);
                }
            }
        }

        Ok(out)
    }
}
