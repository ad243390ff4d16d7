//! Web search adapter.
//!
//! Queries an external search endpoint over HTTP and returns ranked
//! snippets with their source URLs. The endpoint is expected to answer
//! `GET {endpoint}?q={query}&max_results={n}` with a JSON body of
//! `{"results": [{"title", "url", "snippet"}, ...]}`.

use agentflow_config::WebSearchSettings;
use agentflow_core::agent::{ToolConfig, ToolKind};
use agentflow_core::tool::{EvidenceItem, ToolAdapter, ToolOutcome};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub struct WebSearchAdapter {
    client: reqwest::Client,
    settings: WebSearchSettings,
}

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

impl WebSearchAdapter {
    pub fn new(settings: WebSearchSettings, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, settings }
    }

    async fn run(&self, query: &str, tool: &ToolConfig) -> Result<Vec<SearchHit>, String> {
        if self.settings.endpoint.is_empty() {
            return Err("web search endpoint not configured".into());
        }

        let max_results = tool
            .config
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map_or(self.settings.max_results, |v| v as usize);

        let response = self
            .client
            .get(&self.settings.endpoint)
            .query(&[
                ("q", query),
                ("max_results", &max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| format!("search request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("search endpoint returned status {}", status.as_u16()));
        }

        let parsed: SearchApiResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse search response: {e}"))?;

        let mut hits = parsed.results;
        hits.truncate(max_results);
        debug!(query, hits = hits.len(), "web search finished");
        Ok(hits)
    }
}

#[async_trait]
impl ToolAdapter for WebSearchAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    async fn invoke(&self, query: &str, tool: &ToolConfig) -> ToolOutcome {
        match self.run(query, tool).await {
            Ok(hits) => {
                let evidence: Vec<EvidenceItem> = hits
                    .iter()
                    .map(|h| EvidenceItem::Snippet {
                        title: h.title.clone(),
                        url: h.url.clone(),
                        snippet: h.snippet.clone(),
                    })
                    .collect();
                let results: Vec<serde_json::Value> = hits
                    .iter()
                    .map(|h| {
                        serde_json::json!({
                            "title": h.title,
                            "url": h.url,
                            "snippet": h.snippet,
                        })
                    })
                    .collect();
                let output = serde_json::json!({
                    "results": results,
                    "count": results.len(),
                });
                ToolOutcome::ok(output, evidence)
            }
            Err(reason) => {
                warn!(tool = %tool.name, error = %reason, "web search tool failed");
                ToolOutcome::fail(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_config(config: serde_json::Value) -> ToolConfig {
        ToolConfig {
            kind: ToolKind::WebSearch,
            name: "search".into(),
            enabled: true,
            config,
        }
    }

    #[tokio::test]
    async fn missing_endpoint_is_tool_error() {
        let adapter = WebSearchAdapter::new(WebSearchSettings::default(), 10);
        let outcome = adapter
            .invoke("rust news", &tool_config(serde_json::Value::Null))
            .await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_tool_error() {
        let adapter = WebSearchAdapter::new(
            WebSearchSettings {
                endpoint: "http://127.0.0.1:1/search".into(),
                max_results: 5,
            },
            1,
        );
        let outcome = adapter
            .invoke("rust news", &tool_config(serde_json::Value::Null))
            .await;
        assert!(!outcome.success);
        assert!(outcome.evidence.is_empty());
    }

    #[test]
    fn parse_search_response() {
        let data = r#"{
            "results": [
                {"title": "Rust 1.80", "url": "https://blog.rust-lang.org", "snippet": "release notes"},
                {"title": "Rust Book", "url": "https://doc.rust-lang.org/book", "snippet": "learn rust"}
            ]
        }"#;
        let parsed: SearchApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title, "Rust 1.80");
        assert_eq!(parsed.results[1].url, "https://doc.rust-lang.org/book");
    }

    #[test]
    fn parse_response_with_missing_fields() {
        let data = r#"{"results": [{"title": "only title"}]}"#;
        let parsed: SearchApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.results[0].url, "");
        assert_eq!(parsed.results[0].snippet, "");
    }

    #[test]
    fn parse_empty_response() {
        let parsed: SearchApiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
