// src/pipeline/graph.rs
// Directed node graph with conditional edges

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::nodes::NodeRegistry;
use crate::error::PipelineResult;
use crate::pipeline::node::{NodeRuntime, PipelineNode};
use crate::pipeline::state::StateBag;

pub type Label = &'static str;

/// Terminal label; an edge pointing here ends the run.
pub const END: Label = "__end__";

/// Where control goes after a node finishes.
pub enum Edge {
    Next(Label),
    End,
    /// Conditional edge: maps the current state bag to a successor label.
    Branch(Box<dyn Fn(&StateBag) -> Label + Send + Sync>),
}

struct GraphEntry {
    node: Arc<dyn PipelineNode>,
    edge: Edge,
}

/// Compiled pipeline graph. Runs one request single-threaded and
/// cooperatively: nodes execute in sequence, each may fan out internally.
pub struct PipelineGraph {
    entry: Label,
    nodes: HashMap<Label, GraphEntry>,
    runtime: NodeRuntime,
    registry: NodeRegistry,
}

impl PipelineGraph {
    pub fn builder(runtime: NodeRuntime, registry: NodeRegistry) -> GraphBuilder {
        GraphBuilder {
            entry: None,
            nodes: HashMap::new(),
            runtime,
            registry,
        }
    }

    /// Drive `state` through the graph until an End edge or the step cap.
    ///
    /// Best-effort nodes that fail are logged and skipped; mandatory node
    /// failures abort the run and surface to the API layer.
    pub async fn run(&self, mut state: StateBag) -> PipelineResult<StateBag> {
        let mut label = self.entry;
        // Cycle guard; legitimate loops (clarification) span requests, not
        // one run.
        let max_steps = self.nodes.len() * 2 + 8;
        let mut steps = 0;

        while label != END {
            steps += 1;
            if steps > max_steps {
                warn!("Pipeline exceeded {} steps at '{}', terminating", max_steps, label);
                break;
            }

            let entry = match self.nodes.get(label) {
                Some(entry) => entry,
                None => {
                    warn!("Unknown pipeline label '{}', terminating", label);
                    break;
                }
            };

            let timeout_ms = self.registry.timeout_ms(entry.node.name());
            let retry_count = self.registry.retry_count(entry.node.name()).max(1);

            match self
                .runtime
                .dispatch(&entry.node, &state, timeout_ms, retry_count)
                .await
            {
                Ok(update) => {
                    debug!("[{}] produced {} fields", entry.node.name(), update.len());
                    state.merge(update);
                }
                Err(e) if entry.node.best_effort() => {
                    warn!("[{}] degraded (best-effort): {}", entry.node.name(), e);
                }
                Err(e) => return Err(e),
            }

            label = match &entry.edge {
                Edge::Next(next) => *next,
                Edge::End => END,
                Edge::Branch(branch) => branch(&state),
            };
        }

        Ok(state)
    }
}

/// Builds a graph from an enabled-node list. Nodes disabled in the registry
/// are skipped at wiring time by the caller.
pub struct GraphBuilder {
    entry: Option<Label>,
    nodes: HashMap<Label, GraphEntry>,
    runtime: NodeRuntime,
    registry: NodeRegistry,
}

impl GraphBuilder {
    pub fn entry(mut self, label: Label) -> Self {
        self.entry = Some(label);
        self
    }

    pub fn node(mut self, label: Label, node: Arc<dyn PipelineNode>, next: Label) -> Self {
        self.nodes.insert(
            label,
            GraphEntry {
                node,
                edge: Edge::Next(next),
            },
        );
        self
    }

    pub fn terminal(mut self, label: Label, node: Arc<dyn PipelineNode>) -> Self {
        self.nodes.insert(
            label,
            GraphEntry {
                node,
                edge: Edge::End,
            },
        );
        self
    }

    pub fn branch(
        mut self,
        label: Label,
        node: Arc<dyn PipelineNode>,
        branch: impl Fn(&StateBag) -> Label + Send + Sync + 'static,
    ) -> Self {
        self.nodes.insert(
            label,
            GraphEntry {
                node,
                edge: Edge::Branch(Box::new(branch)),
            },
        );
        self
    }

    pub fn build(self) -> PipelineGraph {
        let entry = self.entry.unwrap_or(END);
        PipelineGraph {
            entry,
            nodes: self.nodes,
            runtime: self.runtime,
            registry: self.registry,
        }
    }
}
