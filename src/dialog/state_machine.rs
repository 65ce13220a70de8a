// src/dialog/state_machine.rs
// Dialog states and priority-ordered transition rules

use serde::{Deserialize, Serialize};

use super::analysis::DialogAnalysis;
use crate::config::dialog::DialogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogState {
    #[default]
    Initial,
    AnswerProvided,
    Resolved,
    EscalationNeeded,
    EscalationRequested,
    AwaitingClarification,
    SafetyViolation,
    Blocked,
    LowConfidence,
    StuckLoop,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogState::Initial => "INITIAL",
            DialogState::AnswerProvided => "ANSWER_PROVIDED",
            DialogState::Resolved => "RESOLVED",
            DialogState::EscalationNeeded => "ESCALATION_NEEDED",
            DialogState::EscalationRequested => "ESCALATION_REQUESTED",
            DialogState::AwaitingClarification => "AWAITING_CLARIFICATION",
            DialogState::SafetyViolation => "SAFETY_VIOLATION",
            DialogState::Blocked => "BLOCKED",
            DialogState::LowConfidence => "LOW_CONFIDENCE",
            DialogState::StuckLoop => "STUCK_LOOP",
        }
    }

    /// States that hand the conversation to a human agent.
    pub fn is_escalation(&self) -> bool {
        matches!(
            self,
            DialogState::EscalationNeeded | DialogState::EscalationRequested
        )
    }
}

/// Result of one transition step.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: DialogState,
    pub attempt_count: u32,
    pub reason: &'static str,
}

/// Apply the transition rules in priority order; the first matching signal
/// wins:
///
/// 1. explicit escalation request
/// 2. gratitude -> resolved
/// 3. frustration -> escalation needed
/// 4. repeated question -> answer provided, attempt += 1
/// 5. question -> answer provided (attempt resets from INITIAL/RESOLVED,
///    increments from ANSWER_PROVIDED)
///
/// After the rules, the max-attempts override may force ESCALATION_NEEDED.
pub fn transition(
    current: DialogState,
    attempt_count: u32,
    analysis: &DialogAnalysis,
    config: &DialogConfig,
) -> Transition {
    let mut next = current;
    let mut attempts = attempt_count;
    let mut reason = "no_signal";

    if analysis.escalation_requested {
        next = DialogState::EscalationRequested;
        reason = "escalation_requested";
    } else if analysis.is_gratitude {
        next = DialogState::Resolved;
        reason = "gratitude";
    } else if analysis.frustration_detected {
        next = DialogState::EscalationNeeded;
        reason = "frustration";
    } else if analysis.repeated_question {
        attempts += 1;
        next = DialogState::AnswerProvided;
        reason = "repeated_question";
    } else if analysis.is_question {
        match current {
            DialogState::Initial | DialogState::Resolved => {
                next = DialogState::AnswerProvided;
                attempts = 1;
            }
            DialogState::AnswerProvided => {
                attempts += 1;
            }
            _ => {
                next = DialogState::AnswerProvided;
            }
        }
        reason = "question";
    }

    if config.escalate_on_max_attempts
        && attempts > config.max_attempts
        && !next.is_escalation()
        && next != DialogState::Resolved
    {
        next = DialogState::EscalationNeeded;
        reason = "max_attempts_exceeded";
    }

    Transition {
        state: next,
        attempt_count: attempts,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DialogConfig {
        DialogConfig {
            max_attempts: 3,
            escalate_on_max_attempts: true,
            session_ttl_hours: 24,
            recent_messages_cap: 50,
        }
    }

    fn analysis() -> DialogAnalysis {
        DialogAnalysis::default()
    }

    #[test]
    fn test_escalation_request_beats_everything() {
        let mut signals = analysis();
        signals.escalation_requested = true;
        signals.is_gratitude = true;
        signals.is_question = true;

        let t = transition(DialogState::AnswerProvided, 1, &signals, &config());
        assert_eq!(t.state, DialogState::EscalationRequested);
    }

    #[test]
    fn test_gratitude_resolves() {
        let mut signals = analysis();
        signals.is_gratitude = true;
        signals.is_question = true;

        let t = transition(DialogState::AnswerProvided, 2, &signals, &config());
        assert_eq!(t.state, DialogState::Resolved);
    }

    #[test]
    fn test_frustration_escalates() {
        let mut signals = analysis();
        signals.frustration_detected = true;
        signals.is_question = true;

        let t = transition(DialogState::AnswerProvided, 1, &signals, &config());
        assert_eq!(t.state, DialogState::EscalationNeeded);
    }

    #[test]
    fn test_repeated_question_increments_attempts() {
        let mut signals = analysis();
        signals.repeated_question = true;

        let t = transition(DialogState::AnswerProvided, 1, &signals, &config());
        assert_eq!(t.state, DialogState::AnswerProvided);
        assert_eq!(t.attempt_count, 2);
    }

    #[test]
    fn test_first_question_resets_attempts() {
        let mut signals = analysis();
        signals.is_question = true;

        let t = transition(DialogState::Initial, 0, &signals, &config());
        assert_eq!(t.state, DialogState::AnswerProvided);
        assert_eq!(t.attempt_count, 1);

        let t = transition(DialogState::Resolved, 3, &signals, &config());
        assert_eq!(t.attempt_count, 1);
    }

    #[test]
    fn test_follow_up_question_increments() {
        let mut signals = analysis();
        signals.is_question = true;

        let t = transition(DialogState::AnswerProvided, 1, &signals, &config());
        assert_eq!(t.attempt_count, 2);
        assert_eq!(t.state, DialogState::AnswerProvided);
    }

    #[test]
    fn test_max_attempts_override_escalates() {
        let mut signals = analysis();
        signals.repeated_question = true;

        let t = transition(DialogState::AnswerProvided, 3, &signals, &config());
        assert_eq!(t.attempt_count, 4);
        assert_eq!(t.state, DialogState::EscalationNeeded);
        assert_eq!(t.reason, "max_attempts_exceeded");
    }

    #[test]
    fn test_no_signal_keeps_state() {
        let t = transition(DialogState::AnswerProvided, 2, &analysis(), &config());
        assert_eq!(t.state, DialogState::AnswerProvided);
        assert_eq!(t.attempt_count, 2);
    }

    #[test]
    fn test_state_serializes_screaming_snake() {
        let raw = serde_json::to_string(&DialogState::EscalationRequested).unwrap();
        assert_eq!(raw, "\"ESCALATION_REQUESTED\"");
    }
}
