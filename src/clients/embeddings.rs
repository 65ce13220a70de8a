// src/clients/embeddings.rs
// Embedding service client (multilingual E5 served behind an OpenAI-style API)

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::models::EmbeddingConfig;

/// Client for the embedding server.
///
/// E5 models expect asymmetric prefixes: `query: ` for search queries,
/// `passage: ` for documents. Newlines are flattened before encoding.
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    dimension: u64,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }

    pub fn dimension(&self) -> u64 {
        self.dimension
    }

    /// Embed a single text. `is_query` selects the E5 prefix.
    pub async fn embed(&self, text: &str, is_query: bool) -> Result<Vec<f32>> {
        let prefix = if is_query { "query: " } else { "passage: " };
        let input = format!("{}{}", prefix, text.replace('\n', " "));

        let mut vectors = self.request(vec![input]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow!("Embedding server returned no vectors"))
    }

    /// Embed many texts in one call (passage prefix).
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<String> = texts
            .iter()
            .map(|t| format!("passage: {}", t.replace('\n', " ")))
            .collect();
        self.request(inputs).await
    }

    async fn request(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        debug!("Embedding {} texts", inputs.len());

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embedding server error {}: {}", status, error_text));
        }

        let raw: Value = response.json().await?;
        let data = raw
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| anyhow!("No data array in embedding response"))?;

        let vectors: Vec<Vec<f32>> = data
            .iter()
            .filter_map(|item| {
                item.get("embedding").and_then(|e| e.as_array()).map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect()
                })
            })
            .collect();

        Ok(vectors)
    }
}

/// Cosine similarity between two vectors of the same dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![0.5, 0.5, 0.1];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
