//! Custom HTTP endpoint adapter.
//!
//! Runs a user-configured API call with the query substituted into the
//! request. Tool config shape:
//!
//! ```json
//! {
//!   "url": "https://api.example.com/lookup",
//!   "method": "POST",
//!   "headers": { "Authorization": "Bearer ..." },
//!   "body_template": { "query": "", "lang": "en" },
//!   "content_field": "answer"
//! }
//! ```
//!
//! GET sends the body template as query parameters; POST and PUT send it
//! as JSON. Other methods, non-success statuses, and network failures are
//! tool errors.

use agentflow_core::agent::{ToolConfig, ToolKind};
use agentflow_core::tool::{EvidenceItem, ToolAdapter, ToolOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct CustomHttpAdapter {
    client: reqwest::Client,
}

impl CustomHttpAdapter {
    pub fn new(timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Build the request body: the template with the query injected.
    ///
    /// If the template has a `query` key, its value is replaced; an empty
    /// template becomes `{"query": ...}`.
    fn build_body(template: Option<&serde_json::Value>, query: &str) -> serde_json::Value {
        let mut body = match template {
            Some(serde_json::Value::Object(map)) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if body.contains_key("query") || body.is_empty() {
            body.insert("query".into(), serde_json::Value::String(query.into()));
        }
        serde_json::Value::Object(body)
    }

    async fn run(&self, query: &str, tool: &ToolConfig) -> Result<serde_json::Value, String> {
        let url = tool
            .config
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or("no API URL configured")?;

        let method = tool
            .config
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("POST")
            .to_uppercase();

        let headers: HashMap<String, String> = tool
            .config
            .get("headers")
            .and_then(|h| serde_json::from_value(h.clone()).ok())
            .unwrap_or_default();

        let body = Self::build_body(tool.config.get("body_template"), query);

        let mut request = match method.as_str() {
            "GET" => {
                // Flatten the body into query parameters.
                let params: Vec<(String, String)> = body
                    .as_object()
                    .map(|map| {
                        map.iter()
                            .map(|(k, v)| {
                                let val = match v {
                                    serde_json::Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                };
                                (k.clone(), val)
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                self.client.get(url).query(&params)
            }
            "POST" => self.client.post(url).json(&body),
            "PUT" => self.client.put(url).json(&body),
            other => return Err(format!("unsupported method: {other}")),
        };

        for (name, value) in &headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("API call failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("API call failed with status {}", status.as_u16()));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("failed to parse API response: {e}"))?;

        debug!(tool = %tool.name, url, method, "custom API call finished");
        Ok(data)
    }

    /// Pull the configured content field out of the response, falling back
    /// to the whole payload.
    fn extract_payload(tool: &ToolConfig, data: serde_json::Value) -> serde_json::Value {
        if let Some(field) = tool.config.get("content_field").and_then(|v| v.as_str())
            && let Some(value) = data.get(field)
        {
            return value.clone();
        }
        data
    }
}

#[async_trait]
impl ToolAdapter for CustomHttpAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::CustomHttp
    }

    async fn invoke(&self, query: &str, tool: &ToolConfig) -> ToolOutcome {
        match self.run(query, tool).await {
            Ok(data) => {
                let payload = Self::extract_payload(tool, data.clone());
                let evidence = vec![EvidenceItem::Api {
                    tool_name: tool.name.clone(),
                    payload,
                }];
                ToolOutcome::ok(data, evidence)
            }
            Err(reason) => {
                warn!(tool = %tool.name, error = %reason, "custom API tool failed");
                ToolOutcome::fail(reason)
            }
        }
    }
}
