// src/clients/llm.rs
// Chat LLM client (OpenAI-compatible API)

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::models::LlmConfig;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completion client.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    default_temperature: f32,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            default_temperature: config.temperature,
        }
    }

    /// Single chat completion. Retried once when the first attempt fails
    /// with a timeout/connection error.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
        json_mode: bool,
    ) -> Result<String> {
        match self.chat_once(messages, temperature, json_mode).await {
            Ok(content) => Ok(content),
            Err(e) => {
                let msg = e.to_string().to_lowercase();
                if msg.contains("timeout") || msg.contains("connection") {
                    warn!("LLM call failed ({}), retrying once", e);
                    self.chat_once(messages, temperature, json_mode).await
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn chat_once(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
        json_mode: bool,
    ) -> Result<String> {
        debug!("LLM chat: {} messages, model={}", messages.len(), self.model);

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature.unwrap_or(self.default_temperature),
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("LLM API error {}: {}", status, error_text));
        }

        let raw: Value = response.json().await?;
        let content = raw
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow!("No content in LLM response"))?;

        Ok(content.trim().to_string())
    }
}
