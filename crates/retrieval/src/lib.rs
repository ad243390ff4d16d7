//! Vector search backends for AgentFlow.
//!
//! The engine talks to the vector index through the
//! `agentflow_core::VectorSearch` trait. Production deployments plug in an
//! external index; this crate supplies the similarity math and a
//! partition-scoped in-memory backend for dev and tests.

pub mod in_memory;
pub mod vector;

pub use in_memory::InMemoryIndex;
pub use vector::cosine_similarity;
