// src/pipeline/field.rs
// Canonical state-bag field names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every field a node may read from or write into the state bag.
///
/// Contracts are declared over this enum rather than raw strings, so an
/// undeclarable field is a compile error instead of a silent contract
/// violation at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Question,
    UserId,
    SessionId,
    ConversationHistory,
    DetectedLanguage,
    TranslatedQuery,
    AggregatedQuery,
    Queries,
    CacheHit,
    CacheKey,
    CacheReason,
    Cached,
    Docs,
    Scores,
    VectorResults,
    LexicalResults,
    BestDocMetadata,
    Confidence,
    RerankScores,
    MatchedCategory,
    MatchedIntent,
    ClassificationConfidence,
    FilterUsed,
    FallbackTriggered,
    DialogState,
    DialogAnalysis,
    AttemptCount,
    ClarificationContext,
    Answer,
    EscalationMessage,
    Sources,
    QueryId,
    Action,
    GuardrailsBlocked,
    GuardrailsRiskScore,
    GuardrailsTriggered,
    QuestionEmbedding,
    SystemPrompt,
    HumanPrompt,
    MergedContext,
    ComplexityLevel,
    MultihopUsed,
    HopsPerformed,
    TopicLoopDetected,
    LoopConfidence,
    SimilarMessagesCount,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Question => "question",
            Field::UserId => "user_id",
            Field::SessionId => "session_id",
            Field::ConversationHistory => "conversation_history",
            Field::DetectedLanguage => "detected_language",
            Field::TranslatedQuery => "translated_query",
            Field::AggregatedQuery => "aggregated_query",
            Field::Queries => "queries",
            Field::CacheHit => "cache_hit",
            Field::CacheKey => "cache_key",
            Field::CacheReason => "cache_reason",
            Field::Cached => "cached",
            Field::Docs => "docs",
            Field::Scores => "scores",
            Field::VectorResults => "vector_results",
            Field::LexicalResults => "lexical_results",
            Field::BestDocMetadata => "best_doc_metadata",
            Field::Confidence => "confidence",
            Field::RerankScores => "rerank_scores",
            Field::MatchedCategory => "matched_category",
            Field::MatchedIntent => "matched_intent",
            Field::ClassificationConfidence => "classification_confidence",
            Field::FilterUsed => "filter_used",
            Field::FallbackTriggered => "fallback_triggered",
            Field::DialogState => "dialog_state",
            Field::DialogAnalysis => "dialog_analysis",
            Field::AttemptCount => "attempt_count",
            Field::ClarificationContext => "clarification_context",
            Field::Answer => "answer",
            Field::EscalationMessage => "escalation_message",
            Field::Sources => "sources",
            Field::QueryId => "query_id",
            Field::Action => "action",
            Field::GuardrailsBlocked => "guardrails_blocked",
            Field::GuardrailsRiskScore => "guardrails_risk_score",
            Field::GuardrailsTriggered => "guardrails_triggered",
            Field::QuestionEmbedding => "question_embedding",
            Field::SystemPrompt => "system_prompt",
            Field::HumanPrompt => "human_prompt",
            Field::MergedContext => "merged_context",
            Field::ComplexityLevel => "complexity_level",
            Field::MultihopUsed => "multihop_used",
            Field::HopsPerformed => "hops_performed",
            Field::TopicLoopDetected => "topic_loop_detected",
            Field::LoopConfidence => "loop_confidence",
            Field::SimilarMessagesCount => "similar_messages_count",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| anyhow::anyhow!("Unknown state field: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_round_trips_through_name() {
        for field in [
            Field::Question,
            Field::CacheHit,
            Field::BestDocMetadata,
            Field::SimilarMessagesCount,
        ] {
            let parsed: Field = field.as_str().parse().unwrap();
            assert_eq!(parsed, field);
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!("not_a_field".parse::<Field>().is_err());
    }
}
