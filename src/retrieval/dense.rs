// src/retrieval/dense.rs
// Dense vector search: Qdrant ranking + Postgres content join

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use qdrant_client::qdrant::{point_id::PointIdOptions, Filter};
use tracing::warn;

use crate::clients::qdrant::field_equals;
use crate::clients::VectorStore;
use crate::db::DocumentRepository;

use super::types::SearchResult;

/// Search the `documents` collection by embedding, then hydrate content and
/// metadata from Postgres by id, preserving the vector-rank order.
///
/// A Qdrant failure degrades to an empty result list: the lexical leg of
/// hybrid search still contributes.
pub async fn vector_search(
    vector_store: &Arc<VectorStore>,
    documents: &DocumentRepository,
    collection: &str,
    query_embedding: Vec<f32>,
    top_k: u64,
    category_filter: Option<&str>,
) -> Vec<SearchResult> {
    let filter: Option<Filter> = category_filter.map(|category| field_equals("category", category));

    let points = match vector_store
        .query(collection, query_embedding, top_k, filter, false)
        .await
    {
        Ok(points) => points,
        Err(e) => {
            warn!("Vector search degraded to empty: {}", e);
            return Vec::new();
        }
    };

    if points.is_empty() {
        return Vec::new();
    }

    // Point ids are the Postgres document ids
    let ordered: Vec<(i64, f32)> = points
        .iter()
        .filter_map(|point| {
            let id = match point.id.as_ref()?.point_id_options.as_ref()? {
                PointIdOptions::Num(n) => *n as i64,
                PointIdOptions::Uuid(_) => return None,
            };
            Some((id, point.score))
        })
        .collect();

    let ids: Vec<i64> = ordered.iter().map(|(id, _)| *id).collect();
    let rows = match hydrate(documents, &ids).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Document hydration failed: {}", e);
            return Vec::new();
        }
    };

    ordered
        .into_iter()
        .filter_map(|(id, score)| {
            rows.get(&id).map(|(content, metadata)| SearchResult {
                content: content.clone(),
                score,
                metadata: metadata.clone(),
            })
        })
        .collect()
}

async fn hydrate(
    documents: &DocumentRepository,
    ids: &[i64],
) -> Result<HashMap<i64, (String, serde_json::Value)>> {
    let rows = documents.fetch_by_ids(ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            // Keep the store id available to downstream consumers
            // (multi-hop graph traversal keys off it)
            let mut metadata = row.metadata;
            if metadata.get("id").is_none() {
                if let Some(map) = metadata.as_object_mut() {
                    map.insert("id".to_string(), serde_json::json!(row.id));
                }
            }
            (row.id, (row.content, metadata))
        })
        .collect())
}
