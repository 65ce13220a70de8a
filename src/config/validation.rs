// src/config/validation.rs
// Contract validation toggles for the node dispatch layer

use serde::{Deserialize, Serialize};

/// Controls how the contract layer treats node inputs and outputs.
///
/// When `enabled` is false the dispatch wrapper is a pass-through: no
/// filtering, no validation, no strict checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub enabled: bool,
    /// Promote output contract violations from warnings to hard errors
    pub strict_mode: bool,
    /// Log fields removed by input filtering at debug level
    pub log_filtering: bool,
    /// Log contract violations at warning level
    pub log_violations: bool,
    /// Filter the incoming state down to the declared input contract
    pub filter_inputs: bool,
    /// Strip undeclared fields from node outputs
    pub filter_outputs: bool,
    /// Fail the node when a required input is absent or null
    pub strict_required_inputs: bool,
}

impl ValidationConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: super::helpers::env_bool("VALIDATION_ENABLED", true),
            strict_mode: super::helpers::env_bool("STRICT_MODE", false),
            log_filtering: super::helpers::env_bool("LOG_FILTERING", true),
            log_violations: super::helpers::env_bool("LOG_VIOLATIONS", true),
            filter_inputs: super::helpers::env_bool("FILTER_INPUTS", true),
            filter_outputs: super::helpers::env_bool("FILTER_OUTPUTS", true),
            strict_required_inputs: super::helpers::env_bool("STRICT_REQUIRED_INPUTS", false),
        }
    }

    /// All validation off, used when the graph is driven by trusted callers.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            strict_mode: false,
            log_filtering: false,
            log_violations: false,
            filter_inputs: false,
            filter_outputs: false,
            strict_required_inputs: false,
        }
    }

    /// Everything on, including strict required-input checks.
    pub fn strict() -> Self {
        Self {
            enabled: true,
            strict_mode: false,
            log_filtering: true,
            log_violations: true,
            filter_inputs: true,
            filter_outputs: true,
            strict_required_inputs: true,
        }
    }
}
