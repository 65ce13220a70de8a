// src/error.rs
// Typed errors produced by the pipeline core

use thiserror::Error;

/// Errors surfaced by pipeline nodes and the graph runner.
///
/// Best-effort nodes (cache, translation, loop detection, classification
/// enrichment) never propagate these to the caller - they degrade and
/// continue. Mandatory nodes (retrieval, generation) propagate to the graph,
/// which maps them onto an HTTP status in the API layer.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("node '{node}' missing required input field '{field}'")]
    MissingRequiredInput { node: String, field: String },

    #[error("node '{node}' produced undeclared output field '{field}'")]
    ContractViolation { node: String, field: String },

    #[error("backend '{service}' unavailable: {reason}")]
    BackendUnavailable { service: String, reason: String },

    #[error("node '{node}' timed out after {timeout_ms}ms")]
    Timeout { node: String, timeout_ms: u64 },

    #[error("request blocked by guardrails: {reason}")]
    Guardrail { reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn backend(service: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::BackendUnavailable {
            service: service.into(),
            reason: reason.to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
