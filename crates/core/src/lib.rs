//! # AgentFlow Core
//!
//! Domain types, traits, and error definitions for the AgentFlow execution
//! engine. This crate defines the domain model that all other crates
//! implement against and stays free of framework dependencies.
//!
//! ## Design Philosophy
//!
//! Every collaborator (LLM provider, tool adapter, vector search) is defined
//! as a trait here. Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentConfig, ToolConfig, ToolKind};
pub use error::{EngineError, Error, ProviderError, Result, RetrievalError, ToolError};
pub use event::{EngineEvent, EventSink};
pub use message::{ConversationContext, Role, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
pub use retrieval::{ScoredPassage, VectorSearch};
pub use tool::{Evidence, EvidenceItem, InvocationStatus, ToolAdapter, ToolInvocation, ToolOutcome};
