//! In-memory vector index for testing and ephemeral deployments.

use crate::vector::cosine_similarity;
use agentflow_core::error::RetrievalError;
use agentflow_core::retrieval::{ScoredPassage, VectorSearch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A stored passage with its precomputed embedding.
#[derive(Debug, Clone)]
pub struct IndexedPassage {
    pub content: String,
    pub source: String,
    pub embedding: Vec<f32>,
}

/// An in-memory index keyed by partition. Partitions isolate agents from
/// each other's knowledge, mirroring the production index's scoping.
pub struct InMemoryIndex {
    partitions: Arc<RwLock<HashMap<String, Vec<IndexedPassage>>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            partitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a passage to a partition.
    pub async fn insert(&self, partition_key: &str, passage: IndexedPassage) {
        self.partitions
            .write()
            .await
            .entry(partition_key.to_string())
            .or_default()
            .push(passage);
    }

    pub async fn count(&self, partition_key: &str) -> usize {
        self.partitions
            .read()
            .await
            .get(partition_key)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorSearch for InMemoryIndex {
    async fn search(
        &self,
        partition_key: &str,
        embedding: &[f32],
        top_k: usize,
        threshold: f64,
    ) -> std::result::Result<Vec<ScoredPassage>, RetrievalError> {
        let partitions = self.partitions.read().await;
        let Some(passages) = partitions.get(partition_key) else {
            // An agent with no ingested documents has an empty partition.
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredPassage> = passages
            .iter()
            .filter_map(|p| {
                let sim = cosine_similarity(&p.embedding, embedding);
                if sim >= threshold {
                    Some(ScoredPassage {
                        content: p.content.clone(),
                        source: p.source.clone(),
                        similarity: sim,
                    })
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        debug!(
            partition_key,
            candidates = passages.len(),
            hits = scored.len(),
            "in-memory vector search"
        );
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(content: &str, embedding: Vec<f32>) -> IndexedPassage {
        IndexedPassage {
            content: content.into(),
            source: "test.md".into(),
            embedding,
        }
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let index = InMemoryIndex::new();
        index.insert("p1", passage("orthogonal", vec![0.0, 1.0])).await;
        index.insert("p1", passage("identical", vec![1.0, 0.0])).await;
        index.insert("p1", passage("partial", vec![0.5, 0.5])).await;

        let results = index.search("p1", &[1.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].content, "identical");
        assert_eq!(results[1].content, "partial");
    }

    #[tokio::test]
    async fn search_drops_below_threshold() {
        let index = InMemoryIndex::new();
        index.insert("p1", passage("match", vec![1.0, 0.0])).await;
        index.insert("p1", passage("miss", vec![0.0, 1.0])).await;

        let results = index.search("p1", &[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "match");
    }

    #[tokio::test]
    async fn search_respects_top_k() {
        let index = InMemoryIndex::new();
        for i in 0..10 {
            index
                .insert("p1", passage(&format!("p{i}"), vec![1.0, i as f32 * 0.1]))
                .await;
        }

        let results = index.search("p1", &[1.0, 0.0], 3, 0.0).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let index = InMemoryIndex::new();
        index.insert("alpha", passage("alpha doc", vec![1.0, 0.0])).await;
        index.insert("beta", passage("beta doc", vec![1.0, 0.0])).await;

        let results = index.search("alpha", &[1.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "alpha doc");
    }

    #[tokio::test]
    async fn unknown_partition_is_empty() {
        let index = InMemoryIndex::new();
        let results = index.search("nope", &[1.0], 10, 0.0).await.unwrap();
        assert!(results.is_empty());
    }
}
