use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4";
pub const DEFAULT_REQUEST_LIMIT: u64 = 500;

/// Tunables for snapshot builds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Individual-usage entry that carries the premium request counters.
    pub primary_model: String,
    /// Limit reported when the primary entry has no `maxRequestUsage`.
    pub default_request_limit: u64,
    /// Extra model names recognised in invoice descriptions.
    pub known_models: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            default_request_limit: DEFAULT_REQUEST_LIMIT,
            known_models: Vec::new(),
        }
    }
}
