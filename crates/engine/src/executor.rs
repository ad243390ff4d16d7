//! Concurrent tool execution.
//!
//! Selects the agent's enabled tools that match the iteration's intent,
//! launches every selected adapter at once, and bounds each with its own
//! deadline. A failing or timed-out adapter becomes an errored invocation
//! with no evidence; its siblings keep running.

use crate::intent::IntentKind;
use agentflow_core::agent::{AgentConfig, ToolConfig, ToolKind};
use agentflow_core::event::{EngineEvent, EventSink};
use agentflow_core::tool::{Evidence, ToolInvocation, ToolOutcome};
use agentflow_tools::AdapterRegistry;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

pub struct ToolExecutor {
    registry: Arc<AdapterRegistry>,
    tool_timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<AdapterRegistry>, tool_timeout_secs: u64) -> Self {
        Self {
            registry,
            tool_timeout: Duration::from_secs(tool_timeout_secs),
        }
    }

    /// Tool kinds an intent selects. Custom HTTP tools run alongside any
    /// tool-requiring intent; they never cause one on their own.
    fn selected_kinds(intent: IntentKind) -> &'static [ToolKind] {
        match intent {
            IntentKind::General => &[],
            IntentKind::Retrieval => &[ToolKind::Retrieval, ToolKind::CustomHttp],
            IntentKind::WebSearch => &[ToolKind::WebSearch, ToolKind::CustomHttp],
            IntentKind::Hybrid => &[
                ToolKind::Retrieval,
                ToolKind::WebSearch,
                ToolKind::CustomHttp,
            ],
        }
    }

    /// Retrieval adapters are scoped to the agent's partition; the key is
    /// injected into the tool config before dispatch so the adapter stays
    /// agent-agnostic.
    fn scoped_config(tool: &ToolConfig, agent: &AgentConfig) -> ToolConfig {
        let mut tool = tool.clone();
        if tool.kind == ToolKind::Retrieval {
            let key = serde_json::Value::String(agent.partition_key.clone());
            match &mut tool.config {
                serde_json::Value::Object(map) => {
                    map.insert("partition_key".into(), key);
                }
                other => {
                    *other = serde_json::json!({ "partition_key": key });
                }
            }
        }
        tool
    }

    /// Run every selected tool for this iteration.
    ///
    /// `tool_start` is emitted before each dispatch and `tool_result` when
    /// that adapter resolves; cross-tool ordering is unspecified. Results
    /// come back in configuration order regardless of completion order.
    pub async fn execute(
        &self,
        intent: IntentKind,
        agent: &AgentConfig,
        query: &str,
        iteration: u32,
        sink: &EventSink,
    ) -> (Vec<ToolInvocation>, Evidence) {
        let kinds = Self::selected_kinds(intent);
        let selected: Vec<ToolConfig> = agent
            .enabled_tools()
            .filter(|t| kinds.contains(&t.kind))
            .map(|t| Self::scoped_config(t, agent))
            .collect();

        if selected.is_empty() {
            return (Vec::new(), Evidence::default());
        }

        debug!(
            intent = intent.as_str(),
            tools = selected.len(),
            iteration,
            "dispatching tools"
        );

        for tool in &selected {
            sink.emit(EngineEvent::ToolStart {
                tool_kind: tool.kind,
                tool_name: tool.name.clone(),
                input: query.to_string(),
                iteration,
            })
            .await;
        }

        let futures = selected.into_iter().map(|tool| {
            let sink = sink.clone();
            let adapter = self.registry.get(tool.kind);
            let deadline = self.tool_timeout;
            let query = query.to_string();
            async move {
                let mut invocation = ToolInvocation::started(tool.kind, &tool.name, &query);
                let started = std::time::Instant::now();

                let outcome = match adapter {
                    Some(adapter) => match timeout(deadline, adapter.invoke(&query, &tool)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(tool = %tool.name, timeout_secs = deadline.as_secs(), "tool timed out");
                            ToolOutcome::fail(format!(
                                "timed out after {}s",
                                deadline.as_secs()
                            ))
                        }
                    },
                    None => ToolOutcome::fail(format!(
                        "no adapter registered for kind {}",
                        tool.kind.as_str()
                    )),
                };

                let duration_ms = started.elapsed().as_millis() as u64;
                invocation.resolve(&outcome, duration_ms);

                sink.emit(EngineEvent::ToolResult {
                    tool_kind: tool.kind,
                    tool_name: tool.name.clone(),
                    output: outcome
                        .output
                        .clone()
                        .unwrap_or_else(|| serde_json::json!({ "error": outcome.error })),
                    success: outcome.success,
                    duration_ms,
                    iteration,
                })
                .await;

                (invocation, outcome)
            }
        });

        let mut invocations = Vec::new();
        let mut evidence = Evidence::default();
        for (invocation, outcome) in join_all(futures).await {
            evidence.extend_from(&outcome);
            invocations.push(invocation);
        }

        (invocations, evidence)
    }
}
