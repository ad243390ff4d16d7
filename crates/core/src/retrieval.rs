//! Vector search collaborator trait.
//!
//! The engine does not own a vector index; it talks to one through this
//! trait. A partition-scoped in-memory backend for dev and tests lives in
//! the `agentflow-retrieval` crate.

use crate::error::RetrievalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One ranked passage returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub content: String,

    /// Where the passage came from (document name, chunk label).
    pub source: String,

    /// Cosine similarity against the query embedding, in [0, 1] for
    /// normalized corpora.
    pub similarity: f64,
}

/// The external vector index, scoped by partition key.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `top_k` passages from `partition_key` with similarity
    /// at or above `threshold`, best first. Below-threshold passages are
    /// dropped, never padded.
    async fn search(
        &self,
        partition_key: &str,
        embedding: &[f32],
        top_k: usize,
        threshold: f64,
    ) -> std::result::Result<Vec<ScoredPassage>, RetrievalError>;
}
