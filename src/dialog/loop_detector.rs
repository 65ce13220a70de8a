// src/dialog/loop_detector.rs
// Cross-lingual topic-loop detection over recent user turns

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clients::{cosine_similarity, EmbeddingClient, TranslatorClient};
use crate::config::dialog::LoopDetectorConfig;
use crate::pipeline::Message;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoopDetection {
    pub topic_loop_detected: bool,
    pub loop_confidence: f32,
    pub similar_messages_count: usize,
    pub average_similarity: f32,
}

/// Detects when a user keeps repeating the same intent despite answers.
///
/// All texts are compared in English: multilingual embeddings give
/// unreliably high similarity for unrelated Russian questions, so history
/// and the current question are translated first (stored translations are
/// reused when the session layer saved them).
pub struct TopicLoopDetector {
    embeddings: Arc<EmbeddingClient>,
    translator: Arc<TranslatorClient>,
    config: LoopDetectorConfig,
}

impl TopicLoopDetector {
    pub fn new(
        embeddings: Arc<EmbeddingClient>,
        translator: Arc<TranslatorClient>,
        config: LoopDetectorConfig,
    ) -> Self {
        Self {
            embeddings,
            translator,
            config,
        }
    }

    /// Fail-open entry point: any internal error yields "no loop".
    pub async fn detect(
        &self,
        current_question: &str,
        history: &[Message],
        translated_query: Option<&str>,
        detected_language: Option<&str>,
    ) -> LoopDetection {
        match self
            .detect_inner(current_question, history, translated_query, detected_language)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Loop detection failed open: {}", e);
                LoopDetection::default()
            }
        }
    }

    async fn detect_inner(
        &self,
        current_question: &str,
        history: &[Message],
        translated_query: Option<&str>,
        detected_language: Option<&str>,
    ) -> Result<LoopDetection> {
        // Newest-first window of recent user messages
        let user_messages: Vec<&Message> = history
            .iter()
            .rev()
            .filter(|m| m.is_user())
            .take(self.config.window_size)
            .collect();

        if user_messages.len() < self.config.min_messages_for_loop.saturating_sub(1) {
            return Ok(LoopDetection::default());
        }

        let current_en = match (translated_query, detected_language) {
            (Some(translated), Some(lang)) if lang != "en" && !translated.is_empty() => {
                translated.to_string()
            }
            (_, Some("en")) => current_question.to_string(),
            _ => self.translator.translate_lossy(current_question, "en").await,
        };

        // Reuse translations persisted on the messages; translate the rest
        let mut history_en = Vec::with_capacity(user_messages.len());
        for message in &user_messages {
            let text = match &message.translated {
                Some(translated) => translated.clone(),
                None => self.translator.translate_lossy(&message.content, "en").await,
            };
            history_en.push(text);
        }

        // Single batch call: current question first, then history
        let mut texts = Vec::with_capacity(history_en.len() + 1);
        texts.push(current_en);
        texts.extend(history_en);
        let embeddings = self.embeddings.embed_batch(&texts).await?;

        if embeddings.len() < 2 {
            return Ok(LoopDetection::default());
        }

        let current = &embeddings[0];
        let similarities: Vec<f32> = embeddings[1..]
            .iter()
            .map(|other| cosine_similarity(current, other))
            .collect();

        let similar_count = similarities
            .iter()
            .filter(|&&s| s >= self.config.similarity_threshold)
            .count();

        let average_similarity = if similarities.is_empty() {
            0.0
        } else {
            similarities.iter().sum::<f32>() / similarities.len() as f32
        };

        let loop_detected = similar_count >= self.config.min_messages_for_loop.saturating_sub(1);

        let loop_confidence = if loop_detected {
            let count_factor = (similar_count as f32 / self.config.window_size as f32).min(1.0);
            let similarity_factor = average_similarity.min(1.0);
            (count_factor + similarity_factor) / 2.0
        } else {
            average_similarity
        };

        debug!(
            "Loop detection: {} similar of {} (avg {:.3}), detected={}",
            similar_count,
            similarities.len(),
            average_similarity,
            loop_detected
        );

        Ok(LoopDetection {
            topic_loop_detected: loop_detected,
            loop_confidence,
            similar_messages_count: similar_count,
            average_similarity,
        })
    }
}
