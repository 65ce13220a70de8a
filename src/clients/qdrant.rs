// src/clients/qdrant.rs
// Qdrant vector store wrapper with lazy reconnect

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    Query, QueryPointsBuilder, Range, ScoredPoint, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Shared Qdrant handle for the `documents` and `semantic_cache` collections.
///
/// The inner client is created lazily and dropped on connection errors so
/// the next call reconnects instead of reusing a closed channel.
pub struct VectorStore {
    url: String,
    client: RwLock<Option<Arc<Qdrant>>>,
}

impl VectorStore {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: RwLock::new(None),
        }
    }

    async fn client(&self) -> Result<Arc<Qdrant>> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut guard = self.client.write().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = Qdrant::from_url(&self.url)
            .skip_compatibility_check()
            .build()
            .context("Failed to connect to Qdrant")?;
        let client = Arc::new(client);
        *guard = Some(client.clone());
        info!("Connected to Qdrant at {}", self.url);
        Ok(client)
    }

    /// Drop the cached client so the next call reconnects.
    pub async fn reset(&self) {
        *self.client.write().await = None;
        warn!("Qdrant client reset, will reconnect on next call");
    }

    async fn reset_if_connection_error(&self, error: &anyhow::Error) {
        let msg = error.to_string();
        if msg.contains("channel") || msg.contains("Connection refused") || msg.contains("transport")
        {
            self.reset().await;
        }
    }

    pub async fn ensure_collection(&self, name: &str, dim: u64) -> Result<()> {
        let client = self.client().await?;
        let exists = client.collection_exists(name).await?;
        if exists {
            return Ok(());
        }

        info!("Creating Qdrant collection: {}", name);
        match client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dim, Distance::Cosine)),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                // Another process may have created it between the exists
                // check and the create call.
                if e.to_string().contains("already exists") {
                    debug!("Collection {} already exists", name);
                    Ok(())
                } else {
                    Err(e).context(format!("Failed to create collection: {}", name))
                }
            }
        }
    }

    pub async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<()> {
        let client = self.client().await?;
        let result = client
            .upsert_points(UpsertPointsBuilder::new(collection, points))
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = anyhow::Error::from(e);
                self.reset_if_connection_error(&err).await;
                Err(err.context("Qdrant upsert failed"))
            }
        }
    }

    pub async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<Filter>,
        with_payload: bool,
    ) -> Result<Vec<ScoredPoint>> {
        let client = self.client().await?;

        let mut builder = QueryPointsBuilder::new(collection)
            .query(Query::new_nearest(vector))
            .limit(limit)
            .with_payload(with_payload);
        if let Some(filter) = filter {
            builder = builder.filter(filter);
        }

        match client.query(builder).await {
            Ok(response) => Ok(response.result),
            Err(e) => {
                let err = anyhow::Error::from(e);
                self.reset_if_connection_error(&err).await;
                Err(err.context("Qdrant query failed"))
            }
        }
    }

    /// Delete every point whose numeric `timestamp` payload is below `cutoff`.
    pub async fn delete_older_than(&self, collection: &str, cutoff: f64) -> Result<()> {
        let client = self.client().await?;
        let filter = Filter::must([Condition::range(
            "timestamp",
            Range {
                lt: Some(cutoff),
                ..Default::default()
            },
        )]);

        client
            .delete_points(DeletePointsBuilder::new(collection).points(filter).wait(false))
            .await
            .context("Qdrant delete failed")?;
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        match self.client().await {
            Ok(client) => client.health_check().await.is_ok(),
            Err(_) => false,
        }
    }
}

/// Range filter for "timestamp >= cutoff", used by the semantic cache TTL gate.
pub fn timestamp_at_least(cutoff: f64) -> Filter {
    Filter::must([Condition::range(
        "timestamp",
        Range {
            gte: Some(cutoff),
            ..Default::default()
        },
    )])
}

/// Equality filter on a payload field.
pub fn field_equals(key: &str, value: &str) -> Filter {
    Filter::must([Condition::matches(key, value.to_string())])
}

// === Payload conversion helpers ===

pub fn json_to_payload(value: &serde_json::Value) -> HashMap<String, QdrantValue> {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
            .collect(),
        _ => HashMap::new(),
    }
}

fn json_to_qdrant(value: &serde_json::Value) -> QdrantValue {
    use qdrant_client::qdrant::{value::Kind, ListValue, Struct};

    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Kind::IntegerValue(i)
            } else {
                Kind::DoubleValue(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Kind::StringValue(s.clone()),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_qdrant).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_qdrant(v)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

pub fn payload_to_json(payload: &HashMap<String, QdrantValue>) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = payload
        .iter()
        .map(|(k, v)| (k.clone(), qdrant_to_json(v)))
        .collect();
    serde_json::Value::Object(map)
}

fn qdrant_to_json(value: &QdrantValue) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind;

    match &value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(*b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(*i),
        Some(Kind::DoubleValue(d)) => serde_json::Value::from(*d),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_round_trip() {
        let original = json!({
            "question": "how to reset password",
            "doc_ids": ["a", "b"],
            "timestamp": 1704280000.5,
            "hit_count": 3,
            "nested": {"active": true}
        });

        let payload = json_to_payload(&original);
        let back = payload_to_json(&payload);

        assert_eq!(back["question"], original["question"]);
        assert_eq!(back["doc_ids"], original["doc_ids"]);
        assert_eq!(back["hit_count"], original["hit_count"]);
        assert_eq!(back["nested"]["active"], original["nested"]["active"]);
    }
}
