//! Streamed answer generation.
//!
//! Builds one provider request per iteration and forwards every streamed
//! token through the sink as it arrives; the full answer is accumulated
//! only for evaluation. A provider failure mid-stream is fatal for the
//! invocation: the partial text is never framed as a complete answer.

use agentflow_core::agent::AgentConfig;
use agentflow_core::error::EngineError;
use agentflow_core::event::{EngineEvent, EventSink};
use agentflow_core::message::{ConversationContext, Turn};
use agentflow_core::provider::{Provider, ProviderRequest};
use agentflow_core::tool::Evidence;
use agentflow_telemetry::UsageTracker;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AnswerGenerator {
    provider: Arc<dyn Provider>,
    history_window: usize,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn Provider>, history_window: usize) -> Self {
        Self {
            provider,
            history_window,
        }
    }

    /// Assemble the prompt: persona, evidence block (omitted when empty),
    /// recent history, then the user message.
    fn build_messages(
        &self,
        agent: &AgentConfig,
        ctx: &ConversationContext,
        query: &str,
        evidence: &Evidence,
    ) -> Vec<Turn> {
        let mut messages = Vec::new();

        if !agent.system_prompt.is_empty() {
            messages.push(Turn::system(&agent.system_prompt));
        }

        if !evidence.is_empty() {
            messages.push(Turn::system(format!(
                "Use the following context to answer the user's question:\n\n{}",
                evidence.render()
            )));
        }

        messages.extend(ctx.recent(self.history_window).iter().cloned());
        messages.push(Turn::user(query));
        messages
    }

    /// Stream one answer. Tokens are forwarded as `answer_token` events;
    /// usage chunks are recorded on the tracker as they arrive so a failed
    /// stream still accounts for what it consumed.
    ///
    /// Returns the accumulated answer text. If the consumer goes away the
    /// stream is abandoned and whatever accumulated so far is returned.
    pub async fn generate(
        &self,
        agent: &AgentConfig,
        ctx: &ConversationContext,
        query: &str,
        evidence: &Evidence,
        tracker: &UsageTracker,
        sink: &EventSink,
    ) -> Result<String, EngineError> {
        let request = ProviderRequest {
            model: agent.model.clone(),
            messages: self.build_messages(agent, ctx, query, evidence),
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
            stream: true,
        };

        let mut rx = self
            .provider
            .stream(request)
            .await
            .map_err(|e| EngineError::GenerationFailed(e.to_string()))?;

        let mut answer = String::new();
        while let Some(chunk) = rx.recv().await {
            match chunk {
                Ok(chunk) => {
                    if let Some(usage) = chunk.usage {
                        tracker.record(usage);
                    }
                    if let Some(text) = chunk.content
                        && !text.is_empty()
                    {
                        answer.push_str(&text);
                        if !sink.emit(EngineEvent::AnswerToken { token: text }).await {
                            debug!("consumer gone, abandoning generation stream");
                            return Ok(answer);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "provider stream failed mid-answer");
                    return Err(EngineError::GenerationFailed(e.to_string()));
                }
            }
        }

        debug!(chars = answer.len(), "generation stream finished");
        Ok(answer)
    }
}
