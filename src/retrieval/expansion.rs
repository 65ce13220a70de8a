// src/retrieval/expansion.rs
// LLM-backed query expansion

use std::sync::Arc;

use tracing::warn;

use crate::clients::{ChatMessage, LlmClient};

const EXPANSION_SYSTEM_PROMPT: &str = "You rewrite support questions to improve search recall. \
Generate 3 alternative phrasings of the user's question, keeping the language of the original. \
Return them as a single comma-separated list with no numbering and no extra text.";

/// Produces alternative phrasings of a query for fan-out retrieval.
pub struct QueryExpander {
    llm: Arc<LlmClient>,
}

impl QueryExpander {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Expand the question into alternates. The original is always kept,
    /// duplicates are removed; on failure only the original is returned.
    pub async fn expand(&self, question: &str) -> Vec<String> {
        let messages = [
            ChatMessage::system(EXPANSION_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ];

        // Higher temperature for phrasing variety
        let raw = match self.llm.chat(&messages, Some(0.7), false).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Query expansion failed, using original only: {}", e);
                return vec![question.to_string()];
            }
        };

        let mut queries = vec![question.to_string()];
        for alternate in raw.split(',') {
            let alternate = alternate.trim();
            if alternate.is_empty() {
                continue;
            }
            if !queries.iter().any(|q| q == alternate) {
                queries.push(alternate.to_string());
            }
        }
        queries
    }
}
