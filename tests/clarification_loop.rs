// tests/clarification_loop.rs
// Clarification sub-dialogue lifecycle: initialize, collect answers, finish.

use std::sync::Arc;

use serde_json::json;

use support_rag::clients::LlmClient;
use support_rag::config::models::LlmConfig;
use support_rag::dialog::{ClarificationEngine, DialogState};

fn engine() -> ClarificationEngine {
    // English target language keeps the flow off the LLM entirely
    let config = LlmConfig {
        api_key: "test".to_string(),
        base_url: "http://localhost:9".to_string(),
        model: "test".to_string(),
        temperature: 0.0,
    };
    ClarificationEngine::new(Arc::new(LlmClient::new(&config)))
}

#[tokio::test]
async fn full_clarification_loop() {
    let engine = engine();
    let metadata = json!({
        "id": 42,
        "clarifying_questions": ["Which device?", "Which app version?"],
        "requires_handoff": false,
    });

    // Turn 1: initialization emits the first question
    let step = engine.initialize(&metadata, "en", None).await;
    assert_eq!(step.answer, "Which device?");
    assert_eq!(step.dialog_state, DialogState::AwaitingClarification);
    assert!(step.context.active);
    assert_eq!(step.context.current_index, 0);
    assert_eq!(step.context.questions.len(), 2);

    // Turn 2: the user's reply is recorded, the next question goes out
    let step = engine.advance(step.context, "iphone").await;
    assert_eq!(step.answer, "Which app version?");
    assert_eq!(step.dialog_state, DialogState::AwaitingClarification);
    assert_eq!(step.context.current_index, 1);
    assert_eq!(
        step.context.answers.get("Which device?").and_then(|v| v.as_str()),
        Some("iphone")
    );

    // Turn 3: loop completes, empty answer hands control to generation
    let step = engine.advance(step.context, "3.2.1").await;
    assert_eq!(step.answer, "");
    assert_eq!(step.dialog_state, DialogState::AnswerProvided);
    assert!(!step.context.active);
    assert_eq!(
        step.context
            .answers
            .get("Which app version?")
            .and_then(|v| v.as_str()),
        Some("3.2.1")
    );
}

#[tokio::test]
async fn initialization_without_questions_bails_out() {
    let engine = engine();
    let metadata = json!({"id": 1});

    let step = engine.initialize(&metadata, "en", None).await;
    assert_eq!(step.answer, "");
    assert_eq!(step.dialog_state, DialogState::AnswerProvided);
    assert!(!step.context.active);
}

#[tokio::test]
async fn external_state_override_wins() {
    let engine = engine();
    let metadata = json!({
        "id": 1,
        "clarifying_questions": ["Q1"],
    });

    let step = engine
        .initialize(&metadata, "en", Some(DialogState::Blocked))
        .await;
    assert_eq!(step.dialog_state, DialogState::Blocked);
    assert!(!step.context.active);
}

#[tokio::test]
async fn requires_handoff_carries_into_context() {
    let engine = engine();
    let metadata = json!({
        "id": 7,
        "clarifying_questions": ["Q1"],
        "requires_handoff": true,
    });

    let step = engine.initialize(&metadata, "en", None).await;
    assert!(step.context.requires_handoff);
    assert_eq!(step.context.original_doc_id.as_deref(), Some("7"));
}
