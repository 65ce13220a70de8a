// src/config/server.rs
// Server, database, and infrastructure configuration

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: super::helpers::env_or("HOST", "0.0.0.0"),
            port: super::helpers::env_parsed_or("PORT", 8000),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Postgres document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::require_env("DATABASE_URL"),
            min_connections: super::helpers::env_parsed_or("DATABASE_MIN_CONNECTIONS", 5),
            max_connections: super::helpers::env_parsed_or("DATABASE_MAX_CONNECTIONS", 20),
        }
    }
}

/// Qdrant vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    pub documents_collection: String,
    pub semantic_cache_collection: String,
}

impl QdrantConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::env_or("QDRANT_URL", "http://localhost:6334"),
            documents_collection: super::helpers::env_or("QDRANT_DOCUMENTS_COLLECTION", "documents"),
            semantic_cache_collection: super::helpers::env_or(
                "QDRANT_SEMANTIC_CACHE_COLLECTION",
                "semantic_cache",
            ),
        }
    }
}

/// Redis key/value store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::env_or("REDIS_URL", "redis://localhost:6379/0"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: super::helpers::env_or("LOG_LEVEL", "info"),
        }
    }
}
