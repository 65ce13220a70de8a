// src/api/mod.rs

//! HTTP surface: axum router over the shared application state.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/cache/stats", get(routes::cache_stats))
        .route("/search", get(routes::search))
        .route("/ask", get(routes::ask))
        .route("/rag/query", post(routes::rag_query))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
