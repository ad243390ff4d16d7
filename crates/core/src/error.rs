//! Error types for the AgentFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all AgentFlow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool invocation failed: {tool_name}: {reason}")]
    InvocationFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool configuration: {0}")]
    InvalidConfig(String),

    #[error("Upstream returned status {status_code}: {message}")]
    UpstreamStatus { status_code: u16, message: String },
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Vector search failed: {0}")]
    SearchFailed(String),

    #[error("Unknown partition: {0}")]
    UnknownPartition(String),
}

/// Failures surfaced by the orchestration loop itself.
///
/// Every variant terminates an invocation with an `error` event.
/// Classification and evaluation have no variants here: both are pure
/// heuristics that always produce a verdict, and per-tool failures become
/// errored invocations instead of engine errors.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message too long: {length} chars (max {max})")]
    MessageTooLong { length: usize, max: usize },

    #[error("Token budget exhausted: used {used} of {budget}")]
    BudgetExhausted { used: u64, budget: u64 },

    #[error("Answer generation failed: {0}")]
    GenerationFailed(String),
}
