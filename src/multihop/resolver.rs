// src/multihop/resolver.rs
// Multi-hop traversal from the top retrieved document

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use super::graph::RelationGraph;
use super::merger::{merge_contexts, MergeDoc};

#[derive(Debug, Clone, Default)]
pub struct HopResolution {
    pub merged_context: String,
    pub related_docs: Vec<String>,
    pub hops_performed: u32,
    pub truncated: bool,
}

/// Walks the relation graph from the top-1 document and merges the reached
/// documents into one generation context.
pub struct HopResolver {
    graph: Arc<RelationGraph>,
    max_context_tokens: usize,
}

impl HopResolver {
    pub fn new(graph: Arc<RelationGraph>, max_context_tokens: usize) -> Self {
        Self {
            graph,
            max_context_tokens,
        }
    }

    pub async fn resolve(
        &self,
        question: &str,
        primary_doc: &str,
        primary_metadata: &Value,
        num_hops: u32,
    ) -> Result<HopResolution> {
        self.graph.ensure_built().await?;

        let primary_id = primary_metadata
            .get("id")
            .map(|v| v.to_string().trim_matches('"').to_string());

        let mut hops_performed = 1;
        let mut related_ids: HashSet<String> = HashSet::new();

        if num_hops > 1 {
            if let Some(id) = &primary_id {
                let relations = self.graph.find_related(id).await;
                for candidate in relations
                    .same_category
                    .iter()
                    .chain(relations.same_intent.iter())
                {
                    if candidate != id {
                        related_ids.insert(candidate.clone());
                    }
                }
                if !related_ids.is_empty() {
                    hops_performed += 1;
                }
                debug!(
                    "Hop 1 from doc {}: {} related candidates",
                    id,
                    related_ids.len()
                );
            }
        }

        let mut related = Vec::new();
        for doc_id in &related_ids {
            if let Some(row) = self.graph.get_doc(doc_id).await {
                related.push(MergeDoc {
                    question: row
                        .metadata
                        .get("question")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    answer: row.content,
                    category: row
                        .metadata
                        .get("category")
                        .and_then(|v| v.as_str())
                        .unwrap_or("N/A")
                        .to_string(),
                });
            }
        }

        let primary = MergeDoc {
            question: primary_metadata
                .get("question")
                .and_then(|v| v.as_str())
                .unwrap_or(question)
                .to_string(),
            answer: primary_doc.to_string(),
            category: primary_metadata
                .get("category")
                .and_then(|v| v.as_str())
                .unwrap_or("N/A")
                .to_string(),
        };

        let merged = merge_contexts(&primary, &related, self.max_context_tokens);

        Ok(HopResolution {
            merged_context: merged.combined_text,
            related_docs: related.into_iter().map(|d| d.answer).collect(),
            hops_performed,
            truncated: merged.truncated,
        })
    }
}
