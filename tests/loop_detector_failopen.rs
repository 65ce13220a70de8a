// tests/loop_detector_failopen.rs
// The topic-loop detector must never block the pipeline: any backend
// failure yields "no loop detected".

use std::sync::Arc;

use support_rag::clients::{EmbeddingClient, TranslatorClient};
use support_rag::config::dialog::LoopDetectorConfig;
use support_rag::config::models::{EmbeddingConfig, TranslatorConfig};
use support_rag::dialog::TopicLoopDetector;
use support_rag::pipeline::Message;

fn detector() -> TopicLoopDetector {
    // Port 9 (discard) refuses connections; every backend call fails
    let embeddings = Arc::new(EmbeddingClient::new(&EmbeddingConfig {
        url: "http://127.0.0.1:9".to_string(),
        model: "test".to_string(),
        dimension: 384,
    }));
    let translator = Arc::new(TranslatorClient::new(&TranslatorConfig {
        url: "http://127.0.0.1:9".to_string(),
    }));
    TopicLoopDetector::new(
        embeddings,
        translator,
        LoopDetectorConfig {
            similarity_threshold: 0.85,
            window_size: 4,
            min_messages_for_loop: 3,
        },
    )
}

fn message(content: &str) -> Message {
    let mut m = Message::new("user", content);
    // Stored translations keep the translator out of the loop; only the
    // embedding call remains, and it fails
    m.translated = Some(content.to_string());
    m
}

#[tokio::test]
async fn embedding_failure_fails_open() {
    let detector = detector();
    let history = vec![
        message("reset password"),
        message("reset my password"),
        message("password reset"),
    ];

    let result = detector
        .detect("how to reset the password", &history, Some("how to reset the password"), Some("en"))
        .await;

    assert!(!result.topic_loop_detected);
    assert_eq!(result.similar_messages_count, 0);
    assert_eq!(result.loop_confidence, 0.0);
}

#[tokio::test]
async fn short_history_is_never_a_loop() {
    let detector = detector();
    let history = vec![message("hello")];

    let result = detector.detect("hi", &history, None, Some("en")).await;
    assert!(!result.topic_loop_detected);
}
