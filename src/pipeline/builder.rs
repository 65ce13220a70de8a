// src/pipeline/builder.rs
// Wires the concrete node sequence into a pipeline graph

use std::sync::Arc;

use crate::cache::{ResponseCache, SemanticCache};
use crate::clients::{EmbeddingClient, LlmClient, TranslatorClient};
use crate::config::dialog::DialogConfig;
use crate::config::{NodeRegistry, ValidationConfig};
use crate::db::PersistenceRepository;
use crate::dialog::{ClarificationEngine, TopicLoopDetector};
use crate::generation::Generator;
use crate::guardrails::GuardrailsEngine;
use crate::multihop::HopResolver;
use crate::nodes::*;
use crate::pipeline::graph::{Label, PipelineGraph, END};
use crate::pipeline::node::{NodeRuntime, PipelineNode};
use crate::pipeline::{Field, StateBag};
use crate::retrieval::HybridRetriever;
use crate::session::SessionStore;

const L_INPUT_GUARDRAILS: Label = "input_guardrails";
const L_CHECK_CACHE: Label = "check_cache";
const L_CACHE_SIMILARITY: Label = "cache_similarity";
const L_LANGUAGE_DETECTION: Label = "language_detection";
const L_AGGREGATION: Label = "query_aggregation";
const L_TRANSLATION: Label = "query_translation";
const L_DIALOG_ANALYSIS: Label = "dialog_analysis";
const L_STATE_MACHINE: Label = "state_machine";
const L_CLASSIFICATION: Label = "classification";
const L_METADATA_FILTER: Label = "metadata_filter";
const L_HYBRID_SEARCH: Label = "hybrid_search";
const L_MULTIHOP: Label = "multihop";
const L_CLARIFICATION: Label = "clarification";
const L_GENERATION: Label = "generation";
const L_STORE_IN_CACHE: Label = "store_in_cache";
const L_OUTPUT_GUARDRAILS: Label = "output_guardrails";

/// Everything the standard pipeline needs.
pub struct PipelineDeps {
    pub registry: NodeRegistry,
    pub validation: ValidationConfig,
    pub dialog_config: DialogConfig,
    pub response_cache: Arc<ResponseCache>,
    pub semantic_cache: Arc<SemanticCache>,
    pub sessions: Arc<SessionStore>,
    pub persistence: PersistenceRepository,
    pub retriever: Arc<HybridRetriever>,
    pub loop_detector: Arc<TopicLoopDetector>,
    pub clarification: Arc<ClarificationEngine>,
    pub generator: Arc<Generator>,
    pub hop_resolver: Arc<HopResolver>,
    pub llm: Arc<LlmClient>,
    pub translator: Arc<TranslatorClient>,
    pub embeddings: Arc<EmbeddingClient>,
    pub input_guardrails: Arc<GuardrailsEngine>,
    pub output_guardrails: Arc<GuardrailsEngine>,
}

enum BranchKind {
    /// Plain edge to the next enabled stage
    Seq,
    /// Blocked input jumps straight to the end
    Blocked,
    /// Post-cache branch: a hit skips retrieval and generation
    Cache,
    /// Post-route branch: handoff goes straight to generation, an active
    /// clarification loop goes straight to the clarification node
    Route,
    /// Post-clarification branch: an emitted question is the answer
    Clarify,
}

fn clarification_active(state: &StateBag) -> bool {
    state
        .get(Field::ClarificationContext)
        .and_then(|v| v.get("active"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Build the standard request pipeline. Stages disabled in the node
/// registry are left out of the chain; the guardrails, state machine,
/// retrieval, and generation stages are always present.
pub fn build_pipeline(deps: PipelineDeps) -> PipelineGraph {
    let registry = deps.registry.clone();
    let enabled = |label: Label| registry.is_enabled(label);

    let mut stages: Vec<(Label, Arc<dyn PipelineNode>, BranchKind)> = Vec::new();

    stages.push((
        L_INPUT_GUARDRAILS,
        Arc::new(InputGuardrailsNode::new(deps.input_guardrails.clone())),
        BranchKind::Blocked,
    ));

    let mut cache_stages: Vec<usize> = Vec::new();
    if enabled(L_CHECK_CACHE) {
        stages.push((
            L_CHECK_CACHE,
            Arc::new(CheckCacheNode::new(deps.response_cache.clone())),
            BranchKind::Seq,
        ));
        cache_stages.push(stages.len() - 1);
    }
    if enabled(L_CACHE_SIMILARITY) {
        stages.push((
            L_CACHE_SIMILARITY,
            Arc::new(CacheSimilarityNode::new(
                deps.semantic_cache.clone(),
                deps.response_cache.clone(),
            )),
            BranchKind::Seq,
        ));
        cache_stages.push(stages.len() - 1);
    }
    // The post-cache branch hangs off the last cache stage present
    if let Some(&last) = cache_stages.last() {
        stages[last].2 = BranchKind::Cache;
    }

    stages.push((
        L_LANGUAGE_DETECTION,
        Arc::new(LanguageDetectionNode::new()),
        BranchKind::Seq,
    ));

    if enabled(L_AGGREGATION) {
        stages.push((
            L_AGGREGATION,
            Arc::new(QueryAggregationNode::new(deps.llm.clone())),
            BranchKind::Seq,
        ));
    }
    if enabled(L_TRANSLATION) {
        stages.push((
            L_TRANSLATION,
            Arc::new(QueryTranslationNode::new(deps.translator.clone())),
            BranchKind::Seq,
        ));
    }
    if enabled(L_DIALOG_ANALYSIS) {
        stages.push((
            L_DIALOG_ANALYSIS,
            Arc::new(DialogAnalysisNode::new(deps.loop_detector.clone())),
            BranchKind::Seq,
        ));
    }

    stages.push((
        L_STATE_MACHINE,
        Arc::new(StateMachineNode::new(
            deps.sessions.clone(),
            deps.persistence.clone(),
            deps.dialog_config.clone(),
        )),
        BranchKind::Route,
    ));

    if enabled(L_CLASSIFICATION) {
        stages.push((
            L_CLASSIFICATION,
            Arc::new(ClassificationNode::new(deps.llm.clone())),
            BranchKind::Seq,
        ));
    }
    if enabled(L_METADATA_FILTER) {
        stages.push((
            L_METADATA_FILTER,
            Arc::new(MetadataFilterNode::new(deps.retriever.clone())),
            BranchKind::Seq,
        ));
    }

    stages.push((
        L_HYBRID_SEARCH,
        Arc::new(HybridSearchNode::new(deps.retriever.clone())),
        BranchKind::Seq,
    ));

    if enabled(L_MULTIHOP) {
        stages.push((
            L_MULTIHOP,
            Arc::new(MultihopNode::new(deps.hop_resolver.clone())),
            BranchKind::Seq,
        ));
    }

    let clarification_enabled = enabled(L_CLARIFICATION);
    if clarification_enabled {
        stages.push((
            L_CLARIFICATION,
            Arc::new(ClarificationNode::new(
                deps.clarification.clone(),
                deps.sessions.clone(),
            )),
            BranchKind::Clarify,
        ));
    }

    stages.push((
        L_GENERATION,
        Arc::new(GenerationNode::new(deps.generator.clone())),
        BranchKind::Seq,
    ));

    if enabled(L_STORE_IN_CACHE) {
        stages.push((
            L_STORE_IN_CACHE,
            Arc::new(StoreInCacheNode::new(
                deps.response_cache.clone(),
                deps.semantic_cache.clone(),
                deps.embeddings.clone(),
            )),
            BranchKind::Seq,
        ));
    }

    stages.push((
        L_OUTPUT_GUARDRAILS,
        Arc::new(OutputGuardrailsNode::new(deps.output_guardrails.clone())),
        BranchKind::Seq,
    ));

    // Wire edges
    let runtime = NodeRuntime::new(deps.validation);
    let mut builder = PipelineGraph::builder(runtime, deps.registry).entry(L_INPUT_GUARDRAILS);

    for (index, (label, node, kind)) in stages.iter().enumerate() {
        let next: Label = stages.get(index + 1).map(|(l, _, _)| *l).unwrap_or(END);
        let label = *label;
        let node = node.clone();

        match kind {
            BranchKind::Seq => {
                builder = if next == END {
                    builder.terminal(label, node)
                } else {
                    builder.node(label, node, next)
                };
            }
            BranchKind::Blocked => {
                builder = builder.branch(label, node, move |state| {
                    if state.get_bool(Field::GuardrailsBlocked).unwrap_or(false) {
                        END
                    } else {
                        next
                    }
                });
            }
            BranchKind::Cache => {
                builder = builder.branch(label, node, move |state| {
                    if state.cache_hit() {
                        L_OUTPUT_GUARDRAILS
                    } else {
                        next
                    }
                });
            }
            BranchKind::Route => {
                builder = builder.branch(label, node, move |state| {
                    if state.get_str(Field::Action) == Some("handoff") {
                        L_GENERATION
                    } else if clarification_enabled && clarification_active(state) {
                        L_CLARIFICATION
                    } else {
                        next
                    }
                });
            }
            BranchKind::Clarify => {
                builder = builder.branch(label, node, move |state| {
                    if clarification_active(state) {
                        L_OUTPUT_GUARDRAILS
                    } else {
                        L_GENERATION
                    }
                });
            }
        }
    }

    builder.build()
}
