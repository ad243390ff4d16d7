//! Input guard.
//!
//! Runs once before the loop starts. Rejects messages the engine should
//! never spend a provider call on and normalizes the rest.

use agentflow_config::LimitSettings;
use agentflow_core::error::EngineError;

/// Validate and normalize the incoming user message.
///
/// Empty or whitespace-only messages and messages above the configured
/// character limit are rejected; internal runs of whitespace are collapsed
/// to single spaces.
pub fn sanitize(message: &str, limits: &LimitSettings) -> Result<String, EngineError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(EngineError::EmptyMessage);
    }

    let length = trimmed.chars().count();
    if length > limits.max_message_chars {
        return Err(EngineError::MessageTooLong {
            length,
            max: limits.max_message_chars,
        });
    }

    Ok(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max: usize) -> LimitSettings {
        LimitSettings {
            max_message_chars: max,
            ..LimitSettings::default()
        }
    }

    #[test]
    fn empty_message_rejected() {
        assert!(matches!(
            sanitize("", &LimitSettings::default()),
            Err(EngineError::EmptyMessage)
        ));
        assert!(matches!(
            sanitize("   \n\t ", &LimitSettings::default()),
            Err(EngineError::EmptyMessage)
        ));
    }

    #[test]
    fn overlong_message_rejected() {
        let err = sanitize("hello world", &limits(5)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MessageTooLong { length: 11, max: 5 }
        ));
    }

    #[test]
    fn whitespace_collapsed() {
        let out = sanitize("  what   is\n\nrust?  ", &LimitSettings::default()).unwrap();
        assert_eq!(out, "what is rust?");
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        // Four characters, twelve bytes.
        assert!(sanitize("한국어다", &limits(4)).is_ok());
    }
}
