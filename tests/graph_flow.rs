// tests/graph_flow.rs
// End-to-end graph runs over mock nodes: branching, contract enforcement,
// merge semantics, and failure policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use support_rag::config::nodes::NodeRegistry;
use support_rag::config::ValidationConfig;
use support_rag::error::{PipelineError, PipelineResult};
use support_rag::pipeline::graph::END;
use support_rag::pipeline::{
    Field, InputContract, NodeRuntime, OutputContract, PipelineGraph, PipelineNode, StateBag,
};

/// Mock node that emits a fixed set of fields and counts invocations.
struct MockNode {
    name: &'static str,
    input: InputContract,
    output: OutputContract,
    emits: Vec<(Field, serde_json::Value)>,
    calls: Arc<AtomicUsize>,
    fail: bool,
    best_effort: bool,
}

impl MockNode {
    fn new(name: &'static str, emits: Vec<(Field, serde_json::Value)>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fields: Vec<Field> = emits.iter().map(|(f, _)| *f).collect();
        let node = Arc::new(Self {
            name,
            input: InputContract::new([], [Field::Question, Field::CacheHit]),
            output: OutputContract::new(fields, []),
            emits,
            calls: calls.clone(),
            fail: false,
            best_effort: false,
        });
        (node, calls)
    }

    fn failing(name: &'static str, best_effort: bool) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let node = Arc::new(Self {
            name,
            input: InputContract::new([], [Field::Question]),
            output: OutputContract::new([Field::Answer], []),
            emits: Vec::new(),
            calls: calls.clone(),
            fail: true,
            best_effort,
        });
        (node, calls)
    }
}

#[async_trait]
impl PipelineNode for MockNode {
    fn name(&self) -> &'static str {
        self.name
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    fn best_effort(&self) -> bool {
        self.best_effort
    }

    async fn execute(&self, _state: &StateBag) -> PipelineResult<StateBag> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::backend("mock", "down"));
        }
        let mut out = StateBag::new();
        for (field, value) in &self.emits {
            out.set(*field, value.clone());
        }
        Ok(out)
    }
}

fn runtime() -> NodeRuntime {
    NodeRuntime::new(ValidationConfig::strict())
}

#[tokio::test]
async fn cache_hit_skips_retrieval_and_generation() {
    let (cache_node, cache_calls) = MockNode::new(
        "cache",
        vec![
            (Field::CacheHit, serde_json::json!(true)),
            (Field::Answer, serde_json::json!("cached answer")),
        ],
    );
    let (retrieval_node, retrieval_calls) =
        MockNode::new("retrieval", vec![(Field::Docs, serde_json::json!(["doc"]))]);
    let (final_node, final_calls) = MockNode::new(
        "final",
        vec![(Field::GuardrailsBlocked, serde_json::json!(false))],
    );

    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry("cache")
        .branch("cache", cache_node, |state| {
            if state.cache_hit() {
                "final"
            } else {
                "retrieval"
            }
        })
        .node("retrieval", retrieval_node, "final")
        .terminal("final", final_node)
        .build();

    let result = graph
        .run(StateBag::new().with(Field::Question, "how to reset password"))
        .await
        .unwrap();

    assert_eq!(result.get_str(Field::Answer), Some("cached answer"));
    assert_eq!(cache_calls.load(Ordering::SeqCst), 1);
    assert_eq!(retrieval_calls.load(Ordering::SeqCst), 0, "retrieval must be skipped");
    assert_eq!(final_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cache_miss_runs_the_full_chain() {
    let (cache_node, _) = MockNode::new("cache", vec![(Field::CacheHit, serde_json::json!(false))]);
    let (retrieval_node, retrieval_calls) =
        MockNode::new("retrieval", vec![(Field::Docs, serde_json::json!(["doc"]))]);
    let (final_node, _) = MockNode::new("final", vec![(Field::Answer, serde_json::json!("generated"))]);

    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry("cache")
        .branch("cache", cache_node, |state| {
            if state.cache_hit() {
                "final"
            } else {
                "retrieval"
            }
        })
        .node("retrieval", retrieval_node, "final")
        .terminal("final", final_node)
        .build();

    let result = graph
        .run(StateBag::new().with(Field::Question, "q"))
        .await
        .unwrap();

    assert_eq!(retrieval_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.get_str(Field::Answer), Some("generated"));
}

#[tokio::test]
async fn best_effort_failure_degrades_and_continues() {
    let (flaky, flaky_calls) = MockNode::failing("flaky", true);
    let (final_node, final_calls) =
        MockNode::new("final", vec![(Field::Answer, serde_json::json!("still here"))]);

    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry("flaky")
        .node("flaky", flaky, "final")
        .terminal("final", final_node)
        .build();

    let result = graph
        .run(StateBag::new().with(Field::Question, "q"))
        .await
        .unwrap();

    // The registry default retries transient failures before degrading
    assert!(flaky_calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(final_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.get_str(Field::Answer), Some("still here"));
}

#[tokio::test]
async fn mandatory_failure_aborts_the_run() {
    let (fatal, _) = MockNode::failing("fatal", false);
    let (final_node, final_calls) =
        MockNode::new("final", vec![(Field::Answer, serde_json::json!("unreachable"))]);

    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry("fatal")
        .node("fatal", fatal, "final")
        .terminal("final", final_node)
        .build();

    let err = graph
        .run(StateBag::new().with(Field::Question, "q"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::BackendUnavailable { .. }));
    assert_eq!(final_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn node_outputs_accumulate_into_the_state_bag() {
    let (first, _) = MockNode::new("first", vec![(Field::DetectedLanguage, serde_json::json!("ru"))]);
    let (second, _) = MockNode::new(
        "second",
        vec![(Field::TranslatedQuery, serde_json::json!("reset password"))],
    );

    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry("first")
        .node("first", first, "second")
        .terminal("second", second)
        .build();

    let result = graph
        .run(StateBag::new().with(Field::Question, "сбросить пароль"))
        .await
        .unwrap();

    // Inputs survive, both node outputs merged
    assert_eq!(result.get_str(Field::Question), Some("сбросить пароль"));
    assert_eq!(result.get_str(Field::DetectedLanguage), Some("ru"));
    assert_eq!(result.get_str(Field::TranslatedQuery), Some("reset password"));
}

/// Node whose output violates its contract; the runtime must strip the
/// undeclared field before the merge.
struct LeakyNode {
    input: InputContract,
    output: OutputContract,
}

#[async_trait]
impl PipelineNode for LeakyNode {
    fn name(&self) -> &'static str {
        "leaky"
    }

    fn input_contract(&self) -> &InputContract {
        &self.input
    }

    fn output_contract(&self) -> &OutputContract {
        &self.output
    }

    async fn execute(&self, _state: &StateBag) -> PipelineResult<StateBag> {
        Ok(StateBag::new()
            .with(Field::Answer, "declared")
            .with(Field::Confidence, 0.99))
    }
}

#[tokio::test]
async fn undeclared_output_never_reaches_the_state_bag() {
    let leaky = Arc::new(LeakyNode {
        input: InputContract::new([], [Field::Question]),
        output: OutputContract::new([Field::Answer], []),
    });

    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry("leaky")
        .terminal("leaky", leaky)
        .build();

    let result = graph
        .run(StateBag::new().with(Field::Question, "q"))
        .await
        .unwrap();

    assert_eq!(result.get_str(Field::Answer), Some("declared"));
    assert!(
        !result.has(Field::Confidence),
        "undeclared confidence must be stripped by output validation"
    );
}

#[tokio::test]
async fn unknown_entry_label_terminates_cleanly() {
    let graph = PipelineGraph::builder(runtime(), NodeRegistry::default())
        .entry(END)
        .build();

    let result = graph
        .run(StateBag::new().with(Field::Question, "q"))
        .await
        .unwrap();
    assert_eq!(result.get_str(Field::Question), Some("q"));
}
