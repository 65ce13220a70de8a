// src/warmup.rs
// Model warmup at startup to avoid first-request latency

use std::sync::Arc;

use tracing::{info, warn};

use crate::state::AppState;

/// Fire a dummy call at each model service so weights are loaded before
/// the first user request. Failures are logged, never fatal: the services
/// may still be starting and every call path degrades gracefully.
pub async fn warmup_all(state: &Arc<AppState>) {
    match state.embeddings.embed("warmup", true).await {
        Ok(_) => info!("Embeddings warmed up"),
        Err(e) => warn!("Embeddings warmup failed: {}", e),
    }

    match state.translator.translate("прогрев", "en").await {
        Ok(_) => info!("Translator warmed up"),
        Err(e) => warn!("Translator warmup failed: {}", e),
    }

    if state.vector_store.health_check().await {
        info!("Qdrant reachable");
    } else {
        warn!("Qdrant unreachable, vector search will degrade to lexical only");
    }

    match state.retriever.dense_search("warmup", 1, None).await {
        Ok(_) => info!("Vector search warmed up"),
        Err(e) => warn!("Vector search warmup failed: {}", e),
    }

    if state.response_cache.health_check().await {
        info!("Response cache reachable");
    } else {
        warn!("Response cache unreachable, running on in-process fallback");
    }
}
