// src/api/routes.rs
// HTTP handlers: health, search, ask, and the main RAG query endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::generation::DEGRADED_ANSWER;
use crate::pipeline::{Field, Message, StateBag};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    pub q: String,
    // Accepted for API compatibility; retrieval is always hybrid
    #[serde(default = "default_true")]
    #[allow(dead_code)]
    pub hybrid: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct RagQueryRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_history: Vec<Message>,
    pub user_id: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct RagQueryResponse {
    pub answer: String,
    pub sources: Vec<Value>,
    pub confidence: f32,
    pub query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    let status = if db_ok { "ok" } else { "degraded" };
    let database = if db_ok { "connected" } else { "error" };
    let langfuse = if std::env::var("LANGFUSE_PUBLIC_KEY").is_ok() {
        "configured"
    } else {
        "missing"
    };

    let body = json!({
        "status": status,
        "database": database,
        "langfuse": langfuse,
    });

    if db_ok {
        (StatusCode::OK, Json(body))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.response_cache.metrics().snapshot();
    Json(serde_json::to_value(snapshot).unwrap_or_else(|_| json!({})))
}

/// GET /search?q=...
///
/// Raw scored search over the document store; one embedding, one search.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("Query cannot be empty"));
    }

    let results = state
        .retriever
        .dense_search(query, 3, None)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let results: Vec<Value> = results
        .iter()
        .map(|r| {
            json!({
                "content": r.content,
                "score": r.score,
                "metadata": r.metadata,
            })
        })
        .collect();

    Ok(Json(json!({ "query": query, "results": results })))
}

/// GET /ask?q=...&hybrid=true
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AskParams>,
) -> ApiResult<Json<Value>> {
    let question = params.q.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("Query cannot be empty"));
    }

    let initial = StateBag::new().with(Field::Question, question);
    let result = state.pipeline.run(initial).await?;

    let answer = result
        .get_string(Field::Answer)
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEGRADED_ANSWER.to_string());

    Ok(Json(json!({ "answer": answer })))
}

/// POST /rag/query
///
/// Main entry point for the messenger-bot frontend: runs the full pipeline
/// with per-user session state.
pub async fn rag_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RagQueryRequest>,
) -> ApiResult<impl IntoResponse> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::bad_request("Question cannot be empty"));
    }

    let session = state
        .sessions
        .get_or_create(&request.user_id, &request.session_id)
        .await;

    // Durable mirrors of the Redis session; never block the request on them
    if let Err(e) = state
        .persistence
        .touch_session(&request.session_id, &request.user_id)
        .await
    {
        tracing::warn!("Session mirror update failed: {}", e);
    }
    if let Err(e) = state
        .persistence
        .upsert_user_profile(&request.user_id, None, &json!({}))
        .await
    {
        tracing::warn!("User profile update failed: {}", e);
    }

    // The caller's history wins; the session's recent messages back it up
    let history = if request.conversation_history.is_empty() {
        session.recent_messages.clone()
    } else {
        request.conversation_history.clone()
    };

    state
        .sessions
        .add_message(
            &request.user_id,
            &request.session_id,
            Message::new("user", &question),
        )
        .await;
    if let Err(e) = state
        .persistence
        .save_message(&request.session_id, "user", &question, &json!({}))
        .await
    {
        tracing::warn!("Message persistence failed: {}", e);
    }

    let mut initial = StateBag::new()
        .with(Field::Question, &question)
        .with(Field::UserId, &request.user_id)
        .with(Field::SessionId, &request.session_id)
        .with(Field::ConversationHistory, &history)
        .with(Field::DialogState, session.dialog_state)
        .with(Field::AttemptCount, session.attempt_count);
    if let Some(context) = &session.clarification_context {
        initial.set(Field::ClarificationContext, context);
    }

    let query_id = Uuid::new_v4().to_string();
    info!("RAG query {} for user {}", query_id, request.user_id);

    let (answer, result, degraded) = match state.pipeline.run(initial).await {
        Ok(result) => {
            let answer = result
                .get_string(Field::Answer)
                .filter(|a| !a.is_empty())
                .or_else(|| result.get_string(Field::EscalationMessage))
                .unwrap_or_else(|| DEGRADED_ANSWER.to_string());
            (answer, result, false)
        }
        Err(e) => {
            tracing::error!("Pipeline failed for query {}: {}", query_id, e);
            (DEGRADED_ANSWER.to_string(), StateBag::new(), true)
        }
    };

    state
        .sessions
        .add_message(
            &request.user_id,
            &request.session_id,
            Message::new("assistant", &answer),
        )
        .await;
    if let Err(e) = state
        .persistence
        .save_message(&request.session_id, "assistant", &answer, &json!({}))
        .await
    {
        tracing::warn!("Message persistence failed: {}", e);
    }

    let sources: Vec<Value> = match result.get(Field::Sources) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => vec![Value::Object(map.clone())],
        _ => Vec::new(),
    };

    let response = RagQueryResponse {
        answer,
        sources,
        confidence: result.confidence(),
        query_id,
        metadata: result.get(Field::BestDocMetadata).cloned(),
    };

    // 500 only when no real answer could be assembled
    let status = if degraded {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}
