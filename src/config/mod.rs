// src/config/mod.rs
// Central configuration - composes all domain configs

pub mod cache;
pub mod dialog;
pub mod helpers;
pub mod models;
pub mod nodes;
pub mod retrieval;
pub mod server;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use nodes::NodeRegistry;
pub use validation::ValidationConfig;

/// Main configuration structure, built once at startup and injected through
/// `AppState` rather than read from module-level globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: server::ServerConfig,
    pub database: server::DatabaseConfig,
    pub qdrant: server::QdrantConfig,
    pub redis: server::RedisConfig,
    pub logging: server::LoggingConfig,
    pub cache: cache::CacheConfig,
    pub semantic_cache: cache::SemanticCacheConfig,
    pub retrieval: retrieval::RetrievalConfig,
    pub multihop: retrieval::MultihopConfig,
    pub dialog: dialog::DialogConfig,
    pub loop_detector: dialog::LoopDetectorConfig,
    pub embedding: models::EmbeddingConfig,
    pub llm: models::LlmConfig,
    pub reranker: models::RerankerConfig,
    pub translator: models::TranslatorConfig,
    pub validation: ValidationConfig,
    /// Directory scanned for per-node YAML configs
    pub node_config_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // Missing .env is fine in production
        dotenvy::dotenv().ok();

        Self {
            server: server::ServerConfig::from_env(),
            database: server::DatabaseConfig::from_env(),
            qdrant: server::QdrantConfig::from_env(),
            redis: server::RedisConfig::from_env(),
            logging: server::LoggingConfig::from_env(),
            cache: cache::CacheConfig::from_env(),
            semantic_cache: cache::SemanticCacheConfig::from_env(),
            retrieval: retrieval::RetrievalConfig::from_env(),
            multihop: retrieval::MultihopConfig::from_env(),
            dialog: dialog::DialogConfig::from_env(),
            loop_detector: dialog::LoopDetectorConfig::from_env(),
            embedding: models::EmbeddingConfig::from_env(),
            llm: models::LlmConfig::from_env(),
            reranker: models::RerankerConfig::from_env(),
            translator: models::TranslatorConfig::from_env(),
            validation: ValidationConfig::from_env(),
            node_config_dir: helpers::env_or("NODE_CONFIG_DIR", "config/nodes"),
        }
    }

    /// Validate config on startup
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.api_key.is_empty() {
            anyhow::bail!("LLM_API_KEY must not be empty");
        }
        if self.embedding.dimension == 0 {
            anyhow::bail!("EMBEDDING_DIMENSION must be positive");
        }
        Ok(())
    }
}
