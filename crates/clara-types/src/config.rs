//! Configuration types for Clara.
//!
//! `AssistantConfig` represents the top-level `config.toml` in the data
//! directory. All fields have defaults, so an empty file is valid.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
}

/// Settings for the sales composer's language-model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// OpenAI-compatible base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on the whole call, connect included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "z-ai/glm-4.5-air:free".to_string()
}

fn default_temperature() -> f64 {
    0.25
}

fn default_max_tokens() -> u32 {
    800
}

fn default_timeout_secs() -> u64 {
    50
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Bounds applied by the orchestration core on every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorSettings {
    /// Per-specialist time budget.
    #[serde(default = "default_agent_timeout_ms")]
    pub agent_timeout_ms: u64,

    /// Stored messages loaded as conversation history.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Cross-session messages scanned for memory and style.
    #[serde(default = "default_memory_window")]
    pub memory_window: u32,

    #[serde(default = "default_max_snippets")]
    pub max_snippets: usize,

    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_agent_timeout_ms() -> u64 {
    5_000
}

fn default_history_limit() -> u32 {
    12
}

fn default_memory_window() -> u32 {
    20
}

fn default_max_snippets() -> usize {
    8
}

fn default_snippet_chars() -> usize {
    160
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            agent_timeout_ms: default_agent_timeout_ms(),
            history_limit: default_history_limit(),
            memory_window: default_memory_window(),
            max_snippets: default_max_snippets(),
            snippet_chars: default_snippet_chars(),
        }
    }
}
