//! Agent configuration: the immutable input describing how one agent
//! behaves (persona, model parameters, tool attachments, retrieval scope).

use serde::{Deserialize, Serialize};

/// The kind of a configured tool. Determines which adapter runs it and
/// which intents select it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Vector-store retrieval over the agent's knowledge partition.
    Retrieval,
    /// External web search.
    WebSearch,
    /// A user-configured HTTP endpoint.
    CustomHttp,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Retrieval => "retrieval",
            ToolKind::WebSearch => "web_search",
            ToolKind::CustomHttp => "custom_http",
        }
    }
}

/// One tool attached to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub kind: ToolKind,

    /// Display name, unique within the agent.
    pub name: String,

    /// Disabled tools are skipped by selection and never invoked.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Kind-specific settings (endpoint URL, headers, top_k override, ...).
    #[serde(default)]
    pub config: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

/// Everything the engine needs to run one agent. Built by the caller,
/// treated as immutable for the duration of an invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The agent's persona and instructions.
    pub system_prompt: String,

    /// Model identifier, e.g. "openai/gpt-4o-mini".
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Scopes retrieval to this agent's slice of the vector index.
    pub partition_key: String,

    /// Attached tools, in configuration order.
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

fn default_temperature() -> f32 {
    0.7
}

impl AgentConfig {
    /// Tools that selection may dispatch, in configuration order.
    pub fn enabled_tools(&self) -> impl Iterator<Item = &ToolConfig> {
        self.tools.iter().filter(|t| t.enabled)
    }

    /// The set of kinds with at least one enabled tool.
    pub fn enabled_kinds(&self) -> Vec<ToolKind> {
        let mut kinds = Vec::new();
        for tool in self.enabled_tools() {
            if !kinds.contains(&tool.kind) {
                kinds.push(tool.kind);
            }
        }
        kinds
    }
}
