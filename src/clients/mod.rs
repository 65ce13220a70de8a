// src/clients/mod.rs

//! External service clients. Each is a process-wide handle created once at
//! startup in `AppState::new` and injected into the nodes that use it.

pub mod embeddings;
pub mod llm;
pub mod qdrant;
pub mod redis;
pub mod reranker;
pub mod translator;

pub use embeddings::{cosine_similarity, EmbeddingClient};
pub use llm::{ChatMessage, LlmClient};
pub use qdrant::VectorStore;
pub use redis::RedisConnector;
pub use reranker::RerankerClient;
pub use translator::TranslatorClient;
