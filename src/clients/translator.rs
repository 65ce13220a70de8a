// src/clients/translator.rs
// Translation service client (MarianMT ru<->en behind HTTP)

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::models::TranslatorConfig;

/// Cyrillic Slavic languages the ru<->en model pair has to absorb: the
/// translation backend only knows Russian, so these codes are treated as ru.
const CYRILLIC_SLAVIC: [&str; 5] = ["bg", "uk", "be", "mk", "sr"];

/// Normalize a detected language code for the ru<->en translation pair.
pub fn normalize_lang(code: &str) -> &str {
    if CYRILLIC_SLAVIC.contains(&code) {
        "ru"
    } else {
        code
    }
}

/// Character-script language heuristic: Cyrillic text is Russian, the rest
/// is treated as English. Good enough for routing between the two corpus
/// languages; the translation service does its own detection internally.
pub fn detect_language(text: &str) -> &'static str {
    if text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c)) {
        "ru"
    } else {
        "en"
    }
}

pub struct TranslatorClient {
    client: Client,
    base_url: String,
}

impl TranslatorClient {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    /// Translate `text` into `target`. Returns the input untouched when the
    /// source already matches the target language.
    pub async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let source = normalize_lang(detect_language(text));
        let target = normalize_lang(target);

        if source == target {
            return Ok(text.to_string());
        }

        debug!("Translating {} -> {}", source, target);

        let body = json!({
            "text": text,
            "source": source,
            "target": target,
        });

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Translator error {}: {}", status, error_text));
        }

        let raw: Value = response.json().await?;
        let translation = raw
            .get("translation")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow!("No translation in translator response"))?;

        Ok(translation.to_string())
    }

    /// Best-effort translation: on any backend failure the input text is
    /// returned unchanged so translation never blocks the pipeline.
    pub async fn translate_lossy(&self, text: &str, target: &str) -> String {
        match self.translate(text, target).await {
            Ok(translation) => translation,
            Err(e) => {
                warn!("Translation failed, using original text: {}", e);
                text.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language_cyrillic() {
        assert_eq!(detect_language("Как сбросить пароль?"), "ru");
        assert_eq!(detect_language("How to reset password?"), "en");
    }

    #[test]
    fn test_slavic_codes_normalize_to_russian() {
        for code in ["bg", "uk", "be", "mk", "sr"] {
            assert_eq!(normalize_lang(code), "ru");
        }
        assert_eq!(normalize_lang("en"), "en");
        assert_eq!(normalize_lang("ru"), "ru");
    }
}
