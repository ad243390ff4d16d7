//! The ReAct orchestration loop.
//!
//! One exchange is an explicit state machine: `Classifying` →
//! `ExecutingTools` → `Generating` → `Evaluating`, looping back to
//! `Classifying` on retry, and `Done` when finished. A single transition
//! function drives the machine and every event leaves through one
//! `EventSink`, so the emitted protocol has exactly one producer.
//!
//! Fatal conditions (input guard, token budget, generation failure) emit a
//! terminal `error`; everything else degrades: classification falls back to
//! general, failed tools become errored invocations, and the evaluator is
//! infallible.

use crate::evaluator::Evaluator;
use crate::executor::ToolExecutor;
use crate::generator::AnswerGenerator;
use crate::guard;
use crate::intent::{self, Intent};
use agentflow_config::EngineSettings;
use agentflow_core::agent::AgentConfig;
use agentflow_core::error::EngineError;
use agentflow_core::event::{EngineEvent, EventSink};
use agentflow_core::message::ConversationContext;
use agentflow_core::provider::Provider;
use agentflow_core::tool::{Evidence, ToolInvocation};
use agentflow_telemetry::{PricingTable, UsageTracker};
use agentflow_tools::AdapterRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Hard cap on loop iterations per exchange.
pub const MAX_ITERATIONS: u32 = 3;

/// Where the loop currently is.
enum Phase {
    Classifying,
    ExecutingTools(Intent),
    Generating(Intent),
    Evaluating(Intent),
    Done,
}

/// Mutable state threaded through one exchange. Destroyed on return.
struct LoopState {
    /// The (possibly rewritten) query driving the current iteration.
    query: String,
    iteration: u32,
    /// Invocations from every iteration so far; feeds the re-query bias.
    invocations: Vec<ToolInvocation>,
    /// Evidence for the current iteration only.
    evidence: Evidence,
    /// The last evaluation's rationale, fed back into reclassification.
    prior_rationale: Option<String>,
    answer: String,
    message_id: String,
}

pub struct Orchestrator {
    settings: EngineSettings,
    executor: ToolExecutor,
    generator: AnswerGenerator,
    evaluator: Evaluator,
    pricing: Arc<PricingTable>,
}

impl Orchestrator {
    pub fn new(
        settings: EngineSettings,
        provider: Arc<dyn Provider>,
        registry: Arc<AdapterRegistry>,
        pricing: Arc<PricingTable>,
    ) -> Self {
        let executor = ToolExecutor::new(registry, settings.timeouts.tool_timeout_secs);
        let generator = AnswerGenerator::new(provider, settings.limits.history_window);
        let evaluator = Evaluator::new(settings.evaluation.clone());
        Self {
            settings,
            executor,
            generator,
            evaluator,
            pricing,
        }
    }

    /// Run one exchange to completion, emitting the full event protocol.
    pub async fn run(
        &self,
        agent: AgentConfig,
        ctx: ConversationContext,
        quota: Option<u64>,
        sink: EventSink,
    ) {
        let query = match guard::sanitize(&ctx.user_message, &self.settings.limits) {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, "input rejected");
                sink.emit(EngineEvent::Error {
                    message: e.to_string(),
                })
                .await;
                return;
            }
        };

        info!(model = %agent.model, tools = agent.tools.len(), "exchange starting");

        let tracker = UsageTracker::new(self.pricing.clone(), &agent.model);
        let mut state = LoopState {
            query,
            iteration: 0,
            invocations: Vec::new(),
            evidence: Evidence::default(),
            prior_rationale: None,
            answer: String::new(),
            message_id: String::new(),
        };

        let mut phase = Phase::Classifying;
        loop {
            if sink.is_closed() {
                debug!("consumer gone, abandoning exchange");
                return;
            }

            phase = match self
                .transition(phase, &mut state, &agent, &ctx, &tracker, quota, &sink)
                .await
            {
                Ok(Phase::Done) => break,
                Ok(next) => next,
                Err(e) => {
                    warn!(error = %e, "exchange aborted");
                    sink.emit(EngineEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                    return;
                }
            };
        }

        let report = tracker.finish();
        info!(
            iterations = state.iteration,
            total_tokens = report.usage.total_tokens,
            cost_usd = report.cost_usd,
            "exchange finished"
        );
        sink.emit(EngineEvent::Done {
            usage: report.usage,
            cost_usd: report.cost_usd,
        })
        .await;
    }

    /// The single transition function. Each call performs one phase and
    /// returns the next.
    async fn transition(
        &self,
        phase: Phase,
        state: &mut LoopState,
        agent: &AgentConfig,
        ctx: &ConversationContext,
        tracker: &UsageTracker,
        quota: Option<u64>,
        sink: &EventSink,
    ) -> Result<Phase, EngineError> {
        match phase {
            Phase::Classifying => {
                tracker.check_budget(quota)?;
                state.iteration += 1;

                let enabled = agent.enabled_kinds();
                let intent = intent::classify(
                    &state.query,
                    &state.invocations,
                    state.prior_rationale.as_deref(),
                    &enabled,
                );
                sink.emit(EngineEvent::Thinking {
                    intent: intent.kind.as_str().to_string(),
                    confidence: intent.confidence,
                    rationale: intent.rationale.clone(),
                    iteration: state.iteration,
                })
                .await;

                if intent.kind.requires_tools() {
                    Ok(Phase::ExecutingTools(intent))
                } else {
                    Ok(Phase::Generating(intent))
                }
            }

            Phase::ExecutingTools(intent) => {
                let (invocations, evidence) = self
                    .executor
                    .execute(intent.kind, agent, &state.query, state.iteration, sink)
                    .await;
                state.invocations.extend(invocations);
                state.evidence = evidence;
                Ok(Phase::Generating(intent))
            }

            Phase::Generating(intent) => {
                state.answer = self
                    .generator
                    .generate(agent, ctx, &state.query, &state.evidence, tracker, sink)
                    .await?;
                state.message_id = Uuid::new_v4().to_string();
                sink.emit(EngineEvent::AnswerEnd {
                    message_id: state.message_id.clone(),
                })
                .await;
                Ok(Phase::Evaluating(intent))
            }

            Phase::Evaluating(intent) => {
                let verdict = self.evaluator.evaluate(
                    &state.query,
                    &state.answer,
                    intent.kind,
                    &state.invocations,
                    &state.evidence,
                    state.iteration,
                );
                sink.emit(EngineEvent::Evaluation {
                    score: verdict.score,
                    rationale: verdict.rationale.clone(),
                    retry: verdict.retry,
                    iteration: state.iteration,
                })
                .await;

                if verdict.retry {
                    debug!(
                        iteration = state.iteration,
                        score = verdict.score,
                        "below threshold, re-querying"
                    );
                    state.query = format!(
                        "Please provide a more detailed answer. Original question: {}",
                        state.query
                    );
                    state.evidence = Evidence::default();
                    state.prior_rationale = Some(verdict.rationale);
                    Ok(Phase::Classifying)
                } else {
                    Ok(Phase::Done)
                }
            }

            Phase::Done => Ok(Phase::Done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::error::ProviderError;
    use agentflow_core::provider::{ProviderRequest, ProviderResponse, StreamChunk, Usage};
    use async_trait::async_trait;

    struct FixedAnswerProvider {
        answer: &'static str,
    }

    #[async_trait]
    impl Provider for FixedAnswerProvider {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: self.answer.into(),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock".into(),
            })
        }
        async fn stream(
            &self,
            _request: ProviderRequest,
        ) -> Result<
            tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>,
            ProviderError,
        > {
            let (tx, rx) = tokio::sync::mpsc::channel(2);
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some(self.answer.into()),
                    done: false,
                    usage: None,
                }))
                .await;
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                    usage: Some(Usage {
                        prompt_tokens: 10,
                        completion_tokens: 5,
                        total_tokens: 15,
                    }),
                }))
                .await;
            Ok(rx)
        }
    }

    fn orchestrator(answer: &'static str) -> Orchestrator {
        Orchestrator::new(
            EngineSettings::default(),
            Arc::new(FixedAnswerProvider { answer }),
            Arc::new(AdapterRegistry::new()),
            Arc::new(PricingTable::with_defaults()),
        )
    }

    fn agent() -> AgentConfig {
        AgentConfig {
            system_prompt: "You are helpful.".into(),
            model: "openai/gpt-4o-mini".into(),
            temperature: 0.7,
            max_tokens: None,
            partition_key: "a".into(),
            tools: vec![],
        }
    }

    async fn drain(mut rx: tokio::sync::mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Some(e) = rx.recv().await {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn empty_message_emits_single_error() {
        let orch = orchestrator("unused");
        let (sink, rx) = EventSink::channel(32);
        orch.run(agent(), ConversationContext::new("   "), None, sink)
            .await;

        let events = drain(rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], EngineEvent::Error { message } if message.contains("empty")));
    }

    #[tokio::test]
    async fn exhausted_budget_aborts_with_error() {
        let orch = orchestrator("unused");
        let (sink, rx) = EventSink::channel(32);
        orch.run(agent(), ConversationContext::new("hello"), Some(0), sink)
            .await;

        let events = drain(rx).await;
        assert!(matches!(
            events.last().unwrap(),
            EngineEvent::Error { message } if message.contains("budget")
        ));
    }

    #[tokio::test]
    async fn passing_answer_finishes_in_one_iteration() {
        let orch = orchestrator(
            "Rust is a systems programming language focused on safety and speed, \
             which answers your question about rust directly.",
        );
        let (sink, rx) = EventSink::channel(64);
        orch.run(
            agent(),
            ConversationContext::new("tell me about rust safety speed"),
            None,
            sink,
        )
        .await;

        let events = drain(rx).await;
        let thinking = events
            .iter()
            .filter(|e| matches!(e, EngineEvent::Thinking { .. }))
            .count();
        assert_eq!(thinking, 1);
        assert!(matches!(events.last().unwrap(), EngineEvent::Done { .. }));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_the_loop() {
        let orch = orchestrator("some answer");
        let (sink, rx) = EventSink::channel(64);
        drop(rx);
        // Must return promptly instead of looping forever.
        orch.run(agent(), ConversationContext::new("hello"), None, sink)
            .await;
    }
}
