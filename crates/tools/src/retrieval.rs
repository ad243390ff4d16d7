//! Knowledge-base retrieval adapter.
//!
//! Embeds the query through the provider, then runs a similarity search
//! against the agent's partition of the vector index. Passages below the
//! similarity threshold are dropped, never zero-padded.

use agentflow_config::RetrievalSettings;
use agentflow_core::agent::{ToolConfig, ToolKind};
use agentflow_core::error::{ProviderError, RetrievalError};
use agentflow_core::provider::{EmbeddingRequest, Provider};
use agentflow_core::retrieval::{ScoredPassage, VectorSearch};
use agentflow_core::tool::{EvidenceItem, ToolAdapter, ToolOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RetrievalAdapter {
    provider: Arc<dyn Provider>,
    index: Arc<dyn VectorSearch>,
    embedding_model: String,
    defaults: RetrievalSettings,
}

impl RetrievalAdapter {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorSearch>,
        embedding_model: impl Into<String>,
        defaults: RetrievalSettings,
    ) -> Self {
        Self {
            provider,
            index,
            embedding_model: embedding_model.into(),
            defaults,
        }
    }

    async fn run(
        &self,
        query: &str,
        tool: &ToolConfig,
    ) -> Result<Vec<ScoredPassage>, RetrievalFailure> {
        // The orchestrator injects the agent's partition key into the tool
        // config before dispatch.
        let partition_key = tool
            .config
            .get("partition_key")
            .and_then(|v| v.as_str())
            .ok_or(RetrievalFailure::MissingPartition)?;

        let top_k = tool
            .config
            .get("top_k")
            .and_then(|v| v.as_u64())
            .map_or(self.defaults.top_k, |v| v as usize);
        let threshold = tool
            .config
            .get("similarity_threshold")
            .and_then(|v| v.as_f64())
            .unwrap_or(self.defaults.similarity_threshold);

        let embedding_resp = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await
            .map_err(RetrievalFailure::Embedding)?;

        let embedding = embedding_resp
            .embeddings
            .into_iter()
            .next()
            .ok_or(RetrievalFailure::EmptyEmbedding)?;

        let passages = self
            .index
            .search(partition_key, &embedding, top_k, threshold)
            .await
            .map_err(RetrievalFailure::Search)?;

        debug!(
            partition_key,
            hits = passages.len(),
            top_k,
            threshold,
            "retrieval search finished"
        );
        Ok(passages)
    }
}

enum RetrievalFailure {
    MissingPartition,
    EmptyEmbedding,
    Embedding(ProviderError),
    Search(RetrievalError),
}

impl std::fmt::Display for RetrievalFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPartition => write!(f, "no partition_key in tool config"),
            Self::EmptyEmbedding => write!(f, "provider returned no embedding"),
            Self::Embedding(e) => write!(f, "embedding failed: {e}"),
            Self::Search(e) => write!(f, "search failed: {e}"),
        }
    }
}

#[async_trait]
impl ToolAdapter for RetrievalAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::Retrieval
    }

    async fn invoke(&self, query: &str, tool: &ToolConfig) -> ToolOutcome {
        match self.run(query, tool).await {
            Ok(passages) => {
                let evidence: Vec<EvidenceItem> = passages
                    .iter()
                    .map(|p| EvidenceItem::Passage {
                        content: p.content.clone(),
                        source: p.source.clone(),
                        similarity: p.similarity,
                    })
                    .collect();
                let count = passages.len();
                let output = serde_json::json!({
                    "passages": passages,
                    "count": count,
                });
                ToolOutcome::ok(output, evidence)
            }
            Err(e) => {
                warn!(tool = %tool.name, error = %e, "retrieval tool failed");
                ToolOutcome::fail(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::error::ProviderError;
    use agentflow_core::provider::{
        EmbeddingResponse, ProviderRequest, ProviderResponse,
    };
    use agentflow_retrieval::in_memory::{IndexedPassage, InMemoryIndex};

    struct FixedEmbedProvider {
        embedding: Vec<f32>,
    }

    #[async_trait]
    impl Provider for FixedEmbedProvider {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("completion unused".into()))
        }
        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> std::result::Result<EmbeddingResponse, ProviderError> {
            Ok(EmbeddingResponse {
                embeddings: vec![self.embedding.clone(); request.inputs.len()],
                model: request.model,
                usage: None,
            })
        }
    }

    fn tool_config(config: serde_json::Value) -> ToolConfig {
        ToolConfig {
            kind: ToolKind::Retrieval,
            name: "kb".into(),
            enabled: true,
            config,
        }
    }

    async fn adapter_with_corpus() -> RetrievalAdapter {
        let index = InMemoryIndex::new();
        index
            .insert(
                "agent-1",
                IndexedPassage {
                    content: "Rust enforces memory safety at compile time.".into(),
                    source: "rust.md".into(),
                    embedding: vec![1.0, 0.0],
                },
            )
            .await;
        index
            .insert(
                "agent-1",
                IndexedPassage {
                    content: "Unrelated cooking notes.".into(),
                    source: "food.md".into(),
                    embedding: vec![0.0, 1.0],
                },
            )
            .await;

        RetrievalAdapter::new(
            Arc::new(FixedEmbedProvider {
                embedding: vec![1.0, 0.0],
            }),
            Arc::new(index),
            "text-embedding-3-small",
            RetrievalSettings::default(),
        )
    }

    #[tokio::test]
    async fn returns_relevant_passages_as_evidence() {
        let adapter = adapter_with_corpus().await;
        let outcome = adapter
            .invoke(
                "how does rust handle memory",
                &tool_config(serde_json::json!({"partition_key": "agent-1"})),
            )
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.evidence.len(), 1);
        match &outcome.evidence[0] {
            EvidenceItem::Passage { source, .. } => assert_eq!(source, "rust.md"),
            other => panic!("unexpected evidence: {other:?}"),
        }
    }

    #[tokio::test]
    async fn below_threshold_passages_dropped() {
        let adapter = adapter_with_corpus().await;
        let outcome = adapter
            .invoke(
                "q",
                &tool_config(serde_json::json!({
                    "partition_key": "agent-1",
                    "similarity_threshold": 0.99,
                })),
            )
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.evidence.len(), 1);
        let output = outcome.output.unwrap();
        assert_eq!(output["count"], 1);
    }

    #[tokio::test]
    async fn empty_partition_succeeds_with_no_evidence() {
        let adapter = adapter_with_corpus().await;
        let outcome = adapter
            .invoke(
                "q",
                &tool_config(serde_json::json!({"partition_key": "other-agent"})),
            )
            .await;

        assert!(outcome.success);
        assert!(outcome.evidence.is_empty());
    }

    #[tokio::test]
    async fn missing_partition_key_is_tool_error() {
        let adapter = adapter_with_corpus().await;
        let outcome = adapter
            .invoke("q", &tool_config(serde_json::json!({})))
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("partition_key"));
    }

    #[tokio::test]
    async fn embedding_failure_is_tool_error() {
        struct FailingProvider;

        #[async_trait]
        impl Provider for FailingProvider {
            fn name(&self) -> &str {
                "failing"
            }
            async fn complete(
                &self,
                _request: ProviderRequest,
            ) -> std::result::Result<ProviderResponse, ProviderError> {
                Err(ProviderError::NotConfigured("unused".into()))
            }
            async fn embed(
                &self,
                _request: EmbeddingRequest,
            ) -> std::result::Result<EmbeddingResponse, ProviderError> {
                Err(ProviderError::Network("connection refused".into()))
            }
        }

        let adapter = RetrievalAdapter::new(
            Arc::new(FailingProvider),
            Arc::new(InMemoryIndex::new()),
            "text-embedding-3-small",
            RetrievalSettings::default(),
        );

        let outcome = adapter
            .invoke(
                "q",
                &tool_config(serde_json::json!({"partition_key": "agent-1"})),
            )
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("embedding failed"));
    }
}
