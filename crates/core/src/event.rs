//! Engine event protocol.
//!
//! `EngineEvent` is the typed stream the engine emits while processing one
//! exchange. Consumers (an SSE endpoint, a CLI, tests) receive it over an
//! mpsc channel; the wire encoding is the serde-tagged JSON form. Consumers
//! must ignore event types they do not recognize.

use crate::agent::ToolKind;
use crate::provider::Usage;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during one engine invocation.
///
/// Per-iteration order: `thinking`, then `tool_start`/`tool_result` pairs,
/// then `answer_token`* and `answer_end`, then `evaluation`. Exactly one of
/// `done` or `error` terminates the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Intent classification finished for this iteration.
    Thinking {
        intent: String,
        confidence: f32,
        rationale: String,
        iteration: u32,
    },

    /// An adapter is about to run.
    ToolStart {
        tool_kind: ToolKind,
        tool_name: String,
        input: String,
        iteration: u32,
    },

    /// An adapter resolved (success or failure).
    ToolResult {
        tool_kind: ToolKind,
        tool_name: String,
        output: serde_json::Value,
        success: bool,
        duration_ms: u64,
        iteration: u32,
    },

    /// Answer quality verdict for this iteration.
    Evaluation {
        score: f32,
        rationale: String,
        retry: bool,
        iteration: u32,
    },

    /// One streamed token of the answer.
    AnswerToken { token: String },

    /// The answer stream for this iteration finished.
    AnswerEnd { message_id: String },

    /// Terminal: the exchange completed.
    Done { usage: Usage, cost_usd: f64 },

    /// Terminal: the exchange failed.
    Error { message: String },
}

impl EngineEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolResult { .. } => "tool_result",
            Self::Evaluation { .. } => "evaluation",
            Self::AnswerToken { .. } => "answer_token",
            Self::AnswerEnd { .. } => "answer_end",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// The single outlet for engine events.
///
/// Wraps an mpsc sender; when the consumer drops the receiver, `emit`
/// returns `false` and the loop treats the invocation as cancelled.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    /// Channel pair sized for a streaming exchange.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Send one event. Returns `false` if the consumer has gone away.
    pub async fn emit(&self, event: EngineEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// True once the consumer has dropped the receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_thinking() {
        let event = EngineEvent::Thinking {
            intent: "retrieval".into(),
            confidence: 0.8,
            rationale: "knowledge keywords matched".into(),
            iteration: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"thinking""#));
        assert!(json.contains(r#""intent":"retrieval""#));
        assert!(json.contains(r#""iteration":1"#));
    }

    #[test]
    fn event_serialization_tool_result() {
        let event = EngineEvent::ToolResult {
            tool_kind: ToolKind::WebSearch,
            tool_name: "search".into(),
            output: serde_json::json!({"results": []}),
            success: true,
            duration_ms: 120,
            iteration: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_result""#));
        assert!(json.contains(r#""tool_kind":"web_search""#));
        assert!(json.contains(r#""duration_ms":120"#));
    }

    #[test]
    fn event_serialization_done() {
        let event = EngineEvent::Done {
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 40,
                total_tokens: 140,
            },
            cost_usd: 0.0014,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"done""#));
        assert!(json.contains(r#""total_tokens":140"#));
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            EngineEvent::AnswerToken { token: "x".into() }.event_type(),
            "answer_token"
        );
        assert_eq!(
            EngineEvent::AnswerEnd {
                message_id: "m".into()
            }
            .event_type(),
            "answer_end"
        );
        assert_eq!(
            EngineEvent::Error {
                message: "x".into()
            }
            .event_type(),
            "error"
        );
    }

    #[test]
    fn terminal_events() {
        assert!(EngineEvent::Done {
            usage: Usage::default(),
            cost_usd: 0.0
        }
        .is_terminal());
        assert!(EngineEvent::Error {
            message: "x".into()
        }
        .is_terminal());
        assert!(!EngineEvent::AnswerToken { token: "t".into() }.is_terminal());
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"answer_token","token":"hi"}"#;
        let event: EngineEvent = serde_json::from_str(json).unwrap();
        match event {
            EngineEvent::AnswerToken { token } => assert_eq!(token, "hi"),
            _ => panic!("Wrong variant"),
        }
    }

    #[tokio::test]
    async fn sink_reports_closed_consumer() {
        let (sink, rx) = EventSink::channel(4);
        drop(rx);
        assert!(sink.is_closed());
        assert!(
            !sink
                .emit(EngineEvent::AnswerToken { token: "t".into() })
                .await
        );
    }

    #[tokio::test]
    async fn sink_delivers_events_in_order() {
        let (sink, mut rx) = EventSink::channel(4);
        assert!(
            sink.emit(EngineEvent::AnswerToken { token: "a".into() })
                .await
        );
        assert!(
            sink.emit(EngineEvent::AnswerToken { token: "b".into() })
                .await
        );
        drop(sink);

        let mut tokens = Vec::new();
        while let Some(EngineEvent::AnswerToken { token }) = rx.recv().await {
            tokens.push(token);
        }
        assert_eq!(tokens, vec!["a", "b"]);
    }
}
