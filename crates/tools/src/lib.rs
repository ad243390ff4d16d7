//! Tool adapters for AgentFlow.
//!
//! Three adapters cover the attachable tool kinds: vector retrieval over
//! the agent's knowledge partition, web search, and user-configured HTTP
//! endpoints. All of them honor the adapter boundary contract: failures
//! come back as `ToolOutcome` values, never as errors or panics.

pub mod custom_http;
pub mod retrieval;
pub mod web_search;

pub use custom_http::CustomHttpAdapter;
pub use retrieval::RetrievalAdapter;
pub use web_search::WebSearchAdapter;

use agentflow_core::agent::ToolKind;
use agentflow_core::tool::ToolAdapter;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry mapping tool kinds to their adapters.
///
/// The executor looks adapters up by the kind of each selected tool.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ToolKind, Arc<dyn ToolAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter. Replaces any existing adapter for the same kind.
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        self.adapters.keys().copied().collect()
    }
}
