//! Tool adapter trait and invocation records.
//!
//! Adapters wrap external capabilities (vector retrieval, web search,
//! configured HTTP endpoints). The boundary contract: `invoke` returns a
//! `ToolOutcome` by value and never propagates an error or panic past it.
//! A failing tool becomes data, not a crashed loop.

use crate::agent::{ToolConfig, ToolKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What came back from one adapter call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,

    /// Structured output on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    /// Failure description on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Normalized evidence extracted from the output, ready for the
    /// generation prompt. Empty on failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,
}

impl ToolOutcome {
    pub fn ok(output: serde_json::Value, evidence: Vec<EvidenceItem>) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            evidence,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(reason.into()),
            evidence: Vec::new(),
        }
    }
}

/// The adapter trait every tool kind implements.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Which kind of tool this adapter serves.
    fn kind(&self) -> ToolKind;

    /// Run the tool for one query against one configured tool instance.
    /// Must not panic; all failures are reported through the returned
    /// outcome.
    async fn invoke(&self, query: &str, tool: &ToolConfig) -> ToolOutcome;
}

/// Lifecycle of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Running,
    Completed,
    Error,
}

/// Record of one adapter call within an iteration.
///
/// Every started invocation resolves to `Completed` or `Error` before the
/// iteration's evaluation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub kind: ToolKind,
    pub name: String,

    /// The query the adapter received.
    pub input: String,

    pub status: InvocationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,
}

impl ToolInvocation {
    pub fn started(kind: ToolKind, name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            name: name.into(),
            input: input.into(),
            status: InvocationStatus::Running,
            output: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn resolve(&mut self, outcome: &ToolOutcome, duration_ms: u64) {
        self.status = if outcome.success {
            InvocationStatus::Completed
        } else {
            InvocationStatus::Error
        };
        self.output = outcome.output.clone();
        self.error = outcome.error.clone();
        self.duration_ms = duration_ms;
    }
}

/// One unit of grounding material produced by a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceItem {
    /// A knowledge-base passage with its similarity score.
    Passage {
        content: String,
        source: String,
        similarity: f64,
    },

    /// A web search hit.
    Snippet {
        title: String,
        url: String,
        snippet: String,
    },

    /// Structured response from a configured HTTP endpoint.
    Api {
        tool_name: String,
        payload: serde_json::Value,
    },
}

/// The normalized union of all tool outputs for one iteration.
///
/// Ephemeral: rebuilt each iteration, discarded after generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evidence {
    pub items: Vec<EvidenceItem>,
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend_from(&mut self, outcome: &ToolOutcome) {
        self.items.extend(outcome.evidence.iter().cloned());
    }

    /// Render evidence into the text block injected into the generation
    /// prompt. Sections are separated so the model can attribute sources.
    pub fn render(&self) -> String {
        let mut blocks = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match item {
                EvidenceItem::Passage {
                    content,
                    source,
                    similarity,
                } => {
                    blocks.push(format!(
                        "[knowledge: {source} (relevance {similarity:.2})]\n{content}"
                    ));
                }
                EvidenceItem::Snippet {
                    title,
                    url,
                    snippet,
                } => {
                    blocks.push(format!("[web: {title} <{url}>]\n{snippet}"));
                }
                EvidenceItem::Api { tool_name, payload } => {
                    let body = serde_json::to_string(payload).unwrap_or_default();
                    blocks.push(format!("[api: {tool_name}]\n{body}"));
                }
            }
        }
        blocks.join("\n\n---\n\n")
    }
}
