// src/clients/reranker.rs
// Cross-encoder reranker service client

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::models::RerankerConfig;

/// Client for the cross-encoder reranking service. The service scores each
/// `(query, document)` pair; results come back sorted by relevance.
pub struct RerankerClient {
    client: Client,
    base_url: String,
    model: String,
}

impl RerankerClient {
    pub fn new(config: &RerankerConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Score and sort `docs` against `query`, descending.
    pub async fn rank(&self, query: &str, docs: &[String]) -> Result<Vec<(f32, String)>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Reranking {} docs", docs.len());

        let body = json!({
            "model": self.model,
            "query": query,
            "documents": docs,
        });

        let response = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Reranker error {}: {}", status, error_text));
        }

        let raw: Value = response.json().await?;
        let results = raw
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| anyhow!("No results array in reranker response"))?;

        let mut ranked: Vec<(f32, String)> = results
            .iter()
            .filter_map(|item| {
                let index = item.get("index")?.as_u64()? as usize;
                let score = item.get("relevance_score")?.as_f64()? as f32;
                docs.get(index).map(|doc| (score, doc.clone()))
            })
            .collect();

        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }
}
