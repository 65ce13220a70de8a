// src/pipeline/state.rs
// The mutable state bag carried through one pipeline run

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::field::Field;
use crate::retrieval::types::SearchResult;

/// One turn of the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// English translation cached by the session layer, reused by the
    /// topic-loop detector to avoid re-translating history.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: None,
            translated: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user" || self.role == "human"
    }
}

/// Field-keyed value map owned by a single request.
///
/// Nodes receive a contract-filtered view and return only the fields they
/// produce; the graph merges returned bags into the request's bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateBag {
    values: HashMap<Field, Value>,
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(&mut self, field: Field, value: T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.values.insert(field, v);
            }
            Err(e) => {
                tracing::warn!("Failed to serialize state field '{}': {}", field, e);
            }
        }
    }

    pub fn with<T: Serialize>(mut self, field: Field, value: T) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// A field that is present but null counts as absent.
    pub fn has(&self, field: Field) -> bool {
        matches!(self.values.get(&field), Some(v) if !v.is_null())
    }

    pub fn remove(&mut self, field: Field) -> Option<Value> {
        self.values.remove(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge a node's validated output into this bag (caller-side merge).
    pub fn merge(&mut self, update: StateBag) {
        for (field, value) in update.values {
            self.values.insert(field, value);
        }
    }

    /// Copy of this bag restricted to `allowed` fields.
    pub fn filtered(&self, allowed: &std::collections::HashSet<Field>) -> StateBag {
        let values = self
            .values
            .iter()
            .filter(|(field, _)| allowed.contains(field))
            .map(|(field, value)| (*field, value.clone()))
            .collect();
        StateBag { values }
    }

    // === Typed accessors ===

    pub fn get_str(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(|v| v.as_str())
    }

    pub fn get_string(&self, field: Field) -> Option<String> {
        self.get_str(field).map(|s| s.to_string())
    }

    pub fn get_bool(&self, field: Field) -> Option<bool> {
        self.get(field).and_then(|v| v.as_bool())
    }

    pub fn get_f32(&self, field: Field) -> Option<f32> {
        self.get(field).and_then(|v| v.as_f64()).map(|v| v as f32)
    }

    pub fn get_u32(&self, field: Field) -> Option<u32> {
        self.get(field).and_then(|v| v.as_u64()).map(|v| v as u32)
    }

    pub fn get_as<T: for<'de> Deserialize<'de>>(&self, field: Field) -> Option<T> {
        self.get(field)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn question(&self) -> &str {
        self.get_str(Field::Question).unwrap_or_default()
    }

    /// The query retrieval should run: translated, else aggregated, else raw.
    pub fn effective_query(&self) -> &str {
        self.get_str(Field::TranslatedQuery)
            .filter(|q| !q.is_empty())
            .or_else(|| {
                self.get_str(Field::AggregatedQuery)
                    .filter(|q| !q.is_empty())
            })
            .unwrap_or_else(|| self.question())
    }

    pub fn docs(&self) -> Vec<String> {
        self.get_as(Field::Docs).unwrap_or_default()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.get_as(Field::Scores).unwrap_or_default()
    }

    pub fn history(&self) -> Vec<Message> {
        self.get_as(Field::ConversationHistory).unwrap_or_default()
    }

    pub fn search_results(&self, field: Field) -> Vec<SearchResult> {
        self.get_as(field).unwrap_or_default()
    }

    pub fn cache_hit(&self) -> bool {
        self.get_bool(Field::CacheHit).unwrap_or(false)
    }

    pub fn confidence(&self) -> f32 {
        self.get_f32(Field::Confidence).unwrap_or(0.0)
    }

    pub fn attempt_count(&self) -> u32 {
        self.get_u32(Field::AttemptCount).unwrap_or(0)
    }

    pub fn question_embedding(&self) -> Option<Vec<f32>> {
        self.get_as(Field::QuestionEmbedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_merge_overwrites_and_extends() {
        let mut state = StateBag::new()
            .with(Field::Question, "how to reset password")
            .with(Field::Confidence, 0.4);

        let update = StateBag::new()
            .with(Field::Confidence, 0.9)
            .with(Field::Answer, "use the reset link");
        state.merge(update);

        assert_eq!(state.confidence(), 0.9);
        assert_eq!(state.get_str(Field::Answer), Some("use the reset link"));
        assert_eq!(state.question(), "how to reset password");
    }

    #[test]
    fn test_filtered_keeps_only_allowed_fields() {
        let state = StateBag::new()
            .with(Field::Question, "q")
            .with(Field::Answer, "a")
            .with(Field::Confidence, 1.0);

        let allowed: HashSet<Field> = [Field::Question].into_iter().collect();
        let filtered = state.filtered(&allowed);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.has(Field::Question));
        assert!(!filtered.has(Field::Answer));
    }

    #[test]
    fn test_null_value_counts_as_absent() {
        let state = StateBag::new().with(Field::TranslatedQuery, serde_json::Value::Null);
        assert!(!state.has(Field::TranslatedQuery));
    }

    #[test]
    fn test_effective_query_preference_order() {
        let state = StateBag::new()
            .with(Field::Question, "original")
            .with(Field::AggregatedQuery, "aggregated");
        assert_eq!(state.effective_query(), "aggregated");

        let state = state.with(Field::TranslatedQuery, "translated");
        assert_eq!(state.effective_query(), "translated");
    }
}
