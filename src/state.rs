// src/state.rs
// Application state shared across handlers

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::cache::{ResponseCache, SemanticCache};
use crate::clients::{
    EmbeddingClient, LlmClient, RedisConnector, RerankerClient, TranslatorClient, VectorStore,
};
use crate::config::{AppConfig, NodeRegistry};
use crate::db::{DocumentRepository, PersistenceRepository};
use crate::dialog::{ClarificationEngine, TopicLoopDetector};
use crate::generation::Generator;
use crate::guardrails::GuardrailsEngine;
use crate::multihop::{HopResolver, RelationGraph};
use crate::pipeline::builder::{build_pipeline, PipelineDeps};
use crate::pipeline::PipelineGraph;
use crate::retrieval::{HybridRetriever, QueryExpander};
use crate::session::SessionStore;

/// All process-wide handles, created once at startup and injected.
pub struct AppState {
    pub config: AppConfig,
    pub pool: PgPool,
    pub documents: DocumentRepository,
    pub persistence: PersistenceRepository,
    pub vector_store: Arc<VectorStore>,
    pub embeddings: Arc<EmbeddingClient>,
    pub llm: Arc<LlmClient>,
    pub translator: Arc<TranslatorClient>,
    pub response_cache: Arc<ResponseCache>,
    pub semantic_cache: Arc<SemanticCache>,
    pub sessions: Arc<SessionStore>,
    pub retriever: Arc<HybridRetriever>,
    pub pipeline: PipelineGraph,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let pool = crate::db::connect(&config.database).await?;
        let documents = DocumentRepository::new(pool.clone());
        let persistence = PersistenceRepository::new(pool.clone());

        info!("Initializing model clients");
        let embeddings = Arc::new(EmbeddingClient::new(&config.embedding));
        let llm = Arc::new(LlmClient::new(&config.llm));
        let reranker = Arc::new(RerankerClient::new(&config.reranker));
        let translator = Arc::new(TranslatorClient::new(&config.translator));

        let vector_store = Arc::new(VectorStore::new(&config.qdrant.url));
        let redis = RedisConnector::connect(&config.redis.url).await;

        info!("Initializing response cache");
        let response_cache = Arc::new(ResponseCache::new(redis.clone(), &config.cache));
        let semantic_cache = Arc::new(SemanticCache::new(
            vector_store.clone(),
            embeddings.clone(),
            config.semantic_cache.clone(),
            config.qdrant.semantic_cache_collection.clone(),
        ));

        let sessions = Arc::new(SessionStore::new(redis.clone(), &config.dialog));

        info!("Initializing retrieval stack");
        let expander = QueryExpander::new(llm.clone());
        let retriever = Arc::new(HybridRetriever::new(
            vector_store.clone(),
            documents.clone(),
            embeddings.clone(),
            reranker.clone(),
            expander,
            config.retrieval.clone(),
            config.qdrant.documents_collection.clone(),
        ));

        let relation_graph = Arc::new(RelationGraph::new(documents.clone()));
        let hop_resolver = Arc::new(HopResolver::new(
            relation_graph,
            config.multihop.max_context_tokens,
        ));

        let loop_detector = Arc::new(TopicLoopDetector::new(
            embeddings.clone(),
            translator.clone(),
            config.loop_detector.clone(),
        ));
        let clarification = Arc::new(ClarificationEngine::new(llm.clone()));
        let generator = Arc::new(Generator::new(llm.clone()));

        let node_registry = NodeRegistry::discover(&config.node_config_dir);

        info!("Building pipeline graph");
        let pipeline = build_pipeline(PipelineDeps {
            registry: node_registry,
            validation: config.validation.clone(),
            dialog_config: config.dialog.clone(),
            response_cache: response_cache.clone(),
            semantic_cache: semantic_cache.clone(),
            sessions: sessions.clone(),
            persistence: persistence.clone(),
            retriever: retriever.clone(),
            loop_detector,
            clarification,
            generator,
            hop_resolver,
            llm: llm.clone(),
            translator: translator.clone(),
            embeddings: embeddings.clone(),
            input_guardrails: Arc::new(GuardrailsEngine::input()),
            output_guardrails: Arc::new(GuardrailsEngine::output()),
        });

        info!("Application state initialized");

        Ok(Self {
            config,
            pool,
            documents,
            persistence,
            vector_store,
            embeddings,
            llm,
            translator,
            response_cache,
            semantic_cache,
            sessions,
            retriever,
            pipeline,
        })
    }
}
