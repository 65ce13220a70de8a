// src/config/models.rs
// External model service endpoints (embeddings, LLM, reranker, translator)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    /// Vector dimension of the multilingual embedding model
    pub dimension: u64,
}

impl EmbeddingConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::env_or("EMBEDDING_URL", "http://localhost:8081"),
            model: super::helpers::env_or("EMBEDDING_MODEL", "intfloat/multilingual-e5-small"),
            dimension: super::helpers::env_parsed_or("EMBEDDING_DIMENSION", 384),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: super::helpers::require_env("LLM_API_KEY"),
            base_url: super::helpers::env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            model: super::helpers::env_or("LLM_MODEL", "gpt-4o-mini"),
            temperature: super::helpers::env_parsed_or("LLM_TEMPERATURE", 0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    pub url: String,
    pub model: String,
}

impl RerankerConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::env_or("RERANKER_URL", "http://localhost:8082"),
            model: super::helpers::env_or("RERANKER_MODEL", "cross-encoder/ms-marco-MiniLM-L-6-v2"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub url: String,
}

impl TranslatorConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::env_or("TRANSLATOR_URL", "http://localhost:8083"),
        }
    }
}
