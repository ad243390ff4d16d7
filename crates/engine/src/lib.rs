//! # AgentFlow Engine
//!
//! The ReAct execution loop for one agent exchange: classify the intent,
//! run the matching tools concurrently, stream the answer, evaluate it,
//! and retry up to a hard cap when the answer falls short. Progress is
//! reported as a typed event stream (`EngineEvent`) over an mpsc channel.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use agentflow_config::EngineSettings;
//! # use agentflow_core::agent::AgentConfig;
//! # use agentflow_core::message::ConversationContext;
//! # use agentflow_engine::AgentEngine;
//! # use agentflow_providers::OpenAiCompatProvider;
//! # use agentflow_telemetry::PricingTable;
//! # use agentflow_tools::AdapterRegistry;
//! # async fn demo(agent: AgentConfig) {
//! let settings = EngineSettings::default();
//! let provider = Arc::new(OpenAiCompatProvider::openrouter("key"));
//! let engine = AgentEngine::new(
//!     settings,
//!     provider,
//!     Arc::new(AdapterRegistry::new()),
//!     Arc::new(PricingTable::with_defaults()),
//! );
//!
//! let mut events = engine.run(agent, ConversationContext::new("hello"), None);
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.event_type());
//! }
//! # }
//! ```

pub mod evaluator;
pub mod executor;
pub mod generator;
pub mod guard;
pub mod intent;
pub mod orchestrator;

pub use evaluator::{Evaluation, Evaluator};
pub use executor::ToolExecutor;
pub use generator::AnswerGenerator;
pub use intent::{Intent, IntentKind};
pub use orchestrator::{MAX_ITERATIONS, Orchestrator};

use agentflow_config::EngineSettings;
use agentflow_core::agent::AgentConfig;
use agentflow_core::event::{EngineEvent, EventSink};
use agentflow_core::message::ConversationContext;
use agentflow_core::provider::{Provider, Usage};
use agentflow_telemetry::PricingTable;
use agentflow_tools::AdapterRegistry;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel capacity for one exchange's event stream.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// The engine facade. Construct once, run many exchanges.
///
/// All collaborators are passed in explicitly; the engine never reads
/// ambient process state.
pub struct AgentEngine {
    settings: EngineSettings,
    provider: Arc<dyn Provider>,
    registry: Arc<AdapterRegistry>,
    pricing: Arc<PricingTable>,
}

/// Summary of one drained exchange, produced by [`AgentEngine::collect`].
#[derive(Debug, Clone, Default)]
pub struct ExchangeResult {
    /// The final iteration's answer text.
    pub answer: String,
    /// Id of the final answer, `None` if the exchange errored before one.
    pub message_id: Option<String>,
    /// Iterations the loop ran.
    pub iterations: u32,
    /// Tool invocations observed across all iterations.
    pub tool_calls: u32,
    pub usage: Usage,
    pub cost_usd: f64,
    /// The terminal error message, if the exchange failed.
    pub error: Option<String>,
}

impl AgentEngine {
    pub fn new(
        settings: EngineSettings,
        provider: Arc<dyn Provider>,
        registry: Arc<AdapterRegistry>,
        pricing: Arc<PricingTable>,
    ) -> Self {
        Self {
            settings,
            provider,
            registry,
            pricing,
        }
    }

    /// Run one exchange on a background task.
    ///
    /// Returns the receiving end of the event stream. Dropping the receiver
    /// cancels the exchange: remaining work is abandoned best-effort.
    /// `quota` is an optional total-token budget for the exchange.
    pub fn run(
        &self,
        agent: AgentConfig,
        ctx: ConversationContext,
        quota: Option<u64>,
    ) -> mpsc::Receiver<EngineEvent> {
        let (sink, rx) = EventSink::channel(EVENT_CHANNEL_CAPACITY);
        let orchestrator = Orchestrator::new(
            self.settings.clone(),
            self.provider.clone(),
            self.registry.clone(),
            self.pricing.clone(),
        );

        tokio::spawn(async move {
            orchestrator.run(agent, ctx, quota, sink).await;
        });

        rx
    }

    /// Run one exchange and drain the stream into an [`ExchangeResult`].
    ///
    /// Convenience for callers that do not need token-level streaming.
    pub async fn collect(
        &self,
        agent: AgentConfig,
        ctx: ConversationContext,
        quota: Option<u64>,
    ) -> ExchangeResult {
        let mut rx = self.run(agent, ctx, quota);
        let mut result = ExchangeResult::default();
        let mut buffer = String::new();

        while let Some(event) = rx.recv().await {
            match event {
                EngineEvent::Thinking { iteration, .. } => {
                    result.iterations = result.iterations.max(iteration);
                    buffer.clear();
                }
                EngineEvent::ToolStart { .. } => result.tool_calls += 1,
                EngineEvent::AnswerToken { token } => buffer.push_str(&token),
                EngineEvent::AnswerEnd { message_id } => {
                    result.answer = std::mem::take(&mut buffer);
                    result.message_id = Some(message_id);
                }
                EngineEvent::Done { usage, cost_usd } => {
                    result.usage = usage;
                    result.cost_usd = cost_usd;
                }
                EngineEvent::Error { message } => result.error = Some(message),
                EngineEvent::ToolResult { .. } | EngineEvent::Evaluation { .. } => {}
            }
        }

        result
    }
}
