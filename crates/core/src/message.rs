//! Conversation history types.
//!
//! The engine consumes history read-only: the caller passes prior turns in,
//! the engine returns the new assistant turn for the caller to persist.

use serde::{Deserialize, Serialize};

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (persona, rules, evidence)
    System,
}

impl Role {
    /// Wire-format name used in provider payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// What the engine sees for one exchange: prior turns plus the new user
/// message. Never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,

    /// The new user message driving this exchange.
    pub user_message: String,
}

impl ConversationContext {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            user_message: user_message.into(),
        }
    }

    pub fn with_history(user_message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            history,
            user_message: user_message.into(),
        }
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent(&self, n: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_constructors_set_roles() {
        assert_eq!(Turn::user("hi").role, Role::User);
        assert_eq!(Turn::assistant("hello").role, Role::Assistant);
        assert_eq!(Turn::system("rules").role, Role::System);
    }

    #[test]
    fn recent_returns_tail() {
        let ctx = ConversationContext::with_history(
            "latest",
            (0..5).map(|i| Turn::user(format!("m{i}"))).collect(),
        );
        let tail = ctx.recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "m3");
        assert_eq!(tail[1].content, "m4");
    }

    #[test]
    fn recent_handles_short_history() {
        let ctx = ConversationContext::new("only");
        assert!(ctx.recent(10).is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::user("x")).unwrap();
        assert!(json.contains(r#""role":"user""#));
    }
}
