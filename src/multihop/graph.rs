// src/multihop/graph.rs
// Relation graph over document metadata

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;

use crate::db::{DocumentRepository, DocumentRow};

/// Adjacency for one document.
#[derive(Debug, Clone, Default)]
pub struct DocRelations {
    pub same_category: Vec<String>,
    pub same_intent: Vec<String>,
    pub clarifying_topics: Vec<String>,
}

#[derive(Debug, Default)]
struct GraphData {
    doc_map: HashMap<String, DocumentRow>,
    relations: HashMap<String, DocRelations>,
}

/// Category/intent adjacency over all documents, built once from metadata
/// and shared across requests.
pub struct RelationGraph {
    documents: DocumentRepository,
    data: RwLock<Option<GraphData>>,
}

impl RelationGraph {
    pub fn new(documents: DocumentRepository) -> Self {
        Self {
            documents,
            data: RwLock::new(None),
        }
    }

    /// Build the graph on first use.
    pub async fn ensure_built(&self) -> Result<()> {
        if self.data.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.data.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let rows = self.documents.load_all().await?;
        info!("Building relation graph over {} documents", rows.len());
        *guard = Some(build(rows));
        Ok(())
    }

    pub async fn find_related(&self, doc_id: &str) -> DocRelations {
        self.data
            .read()
            .await
            .as_ref()
            .and_then(|data| data.relations.get(doc_id).cloned())
            .unwrap_or_default()
    }

    pub async fn get_doc(&self, doc_id: &str) -> Option<DocumentRow> {
        self.data
            .read()
            .await
            .as_ref()
            .and_then(|data| data.doc_map.get(doc_id).cloned())
    }
}

fn build(rows: Vec<DocumentRow>) -> GraphData {
    let mut category_index: HashMap<String, Vec<String>> = HashMap::new();
    let mut intent_index: HashMap<String, Vec<String>> = HashMap::new();
    let mut doc_map: HashMap<String, DocumentRow> = HashMap::new();

    for row in rows {
        let id = row.id.to_string();
        if let Some(category) = row.metadata.get("category").and_then(|v| v.as_str()) {
            category_index
                .entry(category.to_string())
                .or_default()
                .push(id.clone());
        }
        if let Some(intent) = row.metadata.get("intent").and_then(|v| v.as_str()) {
            intent_index
                .entry(intent.to_string())
                .or_default()
                .push(id.clone());
        }
        doc_map.insert(id, row);
    }

    let mut relations = HashMap::new();
    for (id, row) in &doc_map {
        let same_category = row
            .metadata
            .get("category")
            .and_then(|v| v.as_str())
            .and_then(|c| category_index.get(c))
            .map(|ids| ids.iter().filter(|d| *d != id).cloned().collect())
            .unwrap_or_default();

        let same_intent = row
            .metadata
            .get("intent")
            .and_then(|v| v.as_str())
            .and_then(|i| intent_index.get(i))
            .map(|ids| ids.iter().filter(|d| *d != id).cloned().collect())
            .unwrap_or_default();

        relations.insert(
            id.clone(),
            DocRelations {
                same_category,
                same_intent,
                clarifying_topics: Vec::new(),
            },
        );
    }

    GraphData { doc_map, relations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64, category: &str, intent: &str) -> DocumentRow {
        DocumentRow {
            id,
            content: format!("doc {}", id),
            metadata: json!({"category": category, "intent": intent}),
        }
    }

    #[test]
    fn test_build_links_same_category_and_intent() {
        let data = build(vec![
            row(1, "Billing", "check_payment_methods"),
            row(2, "Billing", "cancel_subscription"),
            row(3, "Shipping", "check_payment_methods"),
        ]);

        let relations = &data.relations["1"];
        assert_eq!(relations.same_category, vec!["2"]);
        assert_eq!(relations.same_intent, vec!["3"]);
    }

    #[test]
    fn test_document_without_metadata_has_no_relations() {
        let data = build(vec![DocumentRow {
            id: 7,
            content: "orphan".to_string(),
            metadata: json!({}),
        }]);

        let relations = &data.relations["7"];
        assert!(relations.same_category.is_empty());
        assert!(relations.same_intent.is_empty());
    }
}
