// src/generation/mod.rs

//! Generation orchestrator: prompt assembly from retrieved context and the
//! LLM call. Escalation messages pass through untouched.

use std::sync::Arc;

use anyhow::Result;

use crate::clients::{ChatMessage, LlmClient};
use crate::session::ClarificationContext;

/// Fallback answer when generation cannot assemble anything.
pub const DEGRADED_ANSWER: &str = "Не смог найти ответ.";

const QA_SYSTEM_PROMPT: &str = "Ты — ассистент службы поддержки. Отвечай на вопрос пользователя \
только на основе предоставленного контекста. Если контекст не содержит ответа, честно скажи, \
что не знаешь. Отвечай на языке вопроса.";

/// Curly braces in dynamic system prompts are doubled so data artifacts
/// cannot be interpreted as template placeholders downstream.
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Build the human prompt from retrieved docs and the effective query.
pub fn build_human_prompt(docs: &[String], question: &str) -> String {
    let docs_str = docs.join("\n\n");
    format!("Context:\n{}\n\nQuestion: {}", docs_str, question)
}

/// Render collected clarification answers as additional prompt context.
pub fn clarification_block(context: &ClarificationContext) -> Option<String> {
    if context.answers.is_empty() {
        return None;
    }

    let mut lines = vec!["Уточнения от пользователя:".to_string()];
    for (question, answer) in &context.answers {
        lines.push(format!(
            "- {}: {}",
            question,
            answer.as_str().unwrap_or_default()
        ));
    }
    Some(lines.join("\n"))
}

pub struct Generator {
    llm: Arc<LlmClient>,
}

impl Generator {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Generate an answer from the assembled context.
    ///
    /// `system_prompt` overrides the default QA prompt when routing
    /// produced one; its braces are escaped first.
    pub async fn generate(
        &self,
        question: &str,
        docs: &[String],
        system_prompt: Option<&str>,
        human_prompt: Option<&str>,
        clarification: Option<&ClarificationContext>,
    ) -> Result<String> {
        let mut human = match human_prompt {
            Some(prompt) => prompt.to_string(),
            None => build_human_prompt(docs, question),
        };

        if let Some(context) = clarification {
            if let Some(block) = clarification_block(context) {
                human = format!("{}\n\n{}", human, block);
            }
        }

        let system = match system_prompt {
            Some(prompt) => escape_braces(prompt),
            None => QA_SYSTEM_PROMPT.to_string(),
        };

        let messages = [ChatMessage::system(system), ChatMessage::user(human)];
        let answer = self.llm.chat(&messages, None, false).await?;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_escape_braces() {
        assert_eq!(escape_braces("a {b} c"), "a {{b}} c");
        assert_eq!(escape_braces("no braces"), "no braces");
    }

    #[test]
    fn test_build_human_prompt_joins_docs_with_blank_lines() {
        let docs = vec!["doc one".to_string(), "doc two".to_string()];
        let prompt = build_human_prompt(&docs, "what?");
        assert!(prompt.contains("doc one\n\ndoc two"));
        assert!(prompt.ends_with("Question: what?"));
    }

    #[test]
    fn test_clarification_block_rendering() {
        let mut context = ClarificationContext::default();
        context.answers.insert(
            "Which device?".to_string(),
            Value::String("iphone".to_string()),
        );

        let block = clarification_block(&context).unwrap();
        assert!(block.contains("Which device?: iphone"));
    }

    #[test]
    fn test_clarification_block_empty_is_none() {
        assert!(clarification_block(&ClarificationContext::default()).is_none());
    }
}
