// src/config/nodes.rs
// Per-node YAML configuration registry

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// `node:` section of a per-node config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeMeta {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// One node's configuration: metadata plus free-form parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: NodeMeta,
    #[serde(default)]
    pub parameters: HashMap<String, serde_yaml::Value>,
}

/// Global defaults applied when a node config does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalParams {
    pub default_language: String,
    pub timeout_ms: u64,
    pub retry_count: u32,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            default_language: "ru".to_string(),
            timeout_ms: 5000,
            retry_count: 3,
        }
    }
}

/// Discovers `<config_dir>/<node_name>.yaml` files and exposes typed access.
///
/// A node with no config file on disk is treated as enabled with empty
/// parameters, so the registry never gates the pipeline on deployment files.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    configs: HashMap<String, NodeConfig>,
    globals: GlobalParams,
}

impl NodeRegistry {
    pub fn discover(config_dir: impl AsRef<Path>) -> Self {
        let dir = config_dir.as_ref();
        let mut configs = HashMap::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                return Self {
                    configs,
                    globals: GlobalParams::default(),
                }
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match Self::load_file(&path) {
                Ok(config) => {
                    configs.insert(config.node.name.clone(), config);
                }
                Err(e) => warn!("Skipping node config {}: {}", path.display(), e),
            }
        }

        let globals = Self::load_globals(dir).unwrap_or_default();
        Self { configs, globals }
    }

    fn load_file(path: &PathBuf) -> anyhow::Result<NodeConfig> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn load_globals(dir: &Path) -> Option<GlobalParams> {
        let raw = std::fs::read_to_string(dir.join("global.yaml")).ok()?;
        match serde_yaml::from_str(&raw) {
            Ok(globals) => Some(globals),
            Err(e) => {
                warn!("Invalid global.yaml, using defaults: {}", e);
                None
            }
        }
    }

    pub fn is_enabled(&self, node_name: &str) -> bool {
        self.configs
            .get(node_name)
            .map(|c| c.node.enabled)
            .unwrap_or(true)
    }

    pub fn globals(&self) -> &GlobalParams {
        &self.globals
    }

    /// Node-level parameter with fallback to a default
    pub fn param_f32(&self, node_name: &str, key: &str, default: f32) -> f32 {
        self.param(node_name, key)
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(default)
    }

    pub fn param_u64(&self, node_name: &str, key: &str, default: u64) -> u64 {
        self.param(node_name, key)
            .and_then(|v| v.as_u64())
            .unwrap_or(default)
    }

    pub fn param_bool(&self, node_name: &str, key: &str, default: bool) -> bool {
        self.param(node_name, key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    fn param(&self, node_name: &str, key: &str) -> Option<&serde_yaml::Value> {
        self.configs.get(node_name)?.parameters.get(key)
    }

    /// Per-node timeout, falling back to the global default
    pub fn timeout_ms(&self, node_name: &str) -> u64 {
        self.param_u64(node_name, "timeout_ms", self.globals.timeout_ms)
    }

    /// Per-node retry count, falling back to the global default
    pub fn retry_count(&self, node_name: &str) -> u32 {
        self.param_u64(node_name, "retry_count", self.globals.retry_count as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_discover_reads_yaml_configs() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("hybrid_search.yaml")).unwrap();
        writeln!(
            f,
            "node:\n  name: hybrid_search\n  enabled: false\nparameters:\n  final_top_k: 7\n  timeout_ms: 2500"
        )
        .unwrap();

        let registry = NodeRegistry::discover(dir.path());
        assert!(!registry.is_enabled("hybrid_search"));
        assert_eq!(registry.param_u64("hybrid_search", "final_top_k", 10), 7);
        assert_eq!(registry.timeout_ms("hybrid_search"), 2500);
    }

    #[test]
    fn test_unknown_node_defaults_enabled_with_global_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let registry = NodeRegistry::discover(dir.path());
        assert!(registry.is_enabled("generation"));
        assert_eq!(registry.timeout_ms("generation"), 5000);
        assert_eq!(registry.retry_count("generation"), 3);
    }

    #[test]
    fn test_missing_directory_is_not_fatal() {
        let registry = NodeRegistry::discover("/nonexistent/config/dir");
        assert!(registry.is_enabled("check_cache"));
    }
}
