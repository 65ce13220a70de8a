// src/nodes/mod.rs

//! Pipeline node implementations. Each wraps one data-plane service behind
//! a declared input/output contract.

pub mod aggregation;
pub mod cache_similarity;
pub mod check_cache;
pub mod clarification;
pub mod classification;
pub mod dialog_analysis;
pub mod generation;
pub mod guardrails_input;
pub mod guardrails_output;
pub mod hybrid_search;
pub mod language_detection;
pub mod metadata_filter;
pub mod multihop;
pub mod state_machine;
pub mod store_in_cache;
pub mod translation;

pub use aggregation::QueryAggregationNode;
pub use cache_similarity::CacheSimilarityNode;
pub use check_cache::CheckCacheNode;
pub use clarification::ClarificationNode;
pub use classification::ClassificationNode;
pub use dialog_analysis::DialogAnalysisNode;
pub use generation::GenerationNode;
pub use guardrails_input::InputGuardrailsNode;
pub use guardrails_output::OutputGuardrailsNode;
pub use hybrid_search::HybridSearchNode;
pub use language_detection::LanguageDetectionNode;
pub use metadata_filter::MetadataFilterNode;
pub use multihop::MultihopNode;
pub use state_machine::StateMachineNode;
pub use store_in_cache::StoreInCacheNode;
pub use translation::QueryTranslationNode;
