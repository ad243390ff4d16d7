//! Configuration loading and validation for the AgentFlow engine.
//!
//! Loads `EngineSettings` from a TOML file with environment variable
//! overrides for credentials. Settings are passed to the engine explicitly
//! at construction; the engine never reads ambient process state itself.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root settings structure for one engine instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// LLM provider connection.
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Answer evaluation thresholds.
    #[serde(default)]
    pub evaluation: EvaluationSettings,

    /// Input guard limits.
    #[serde(default)]
    pub limits: LimitSettings,

    /// Per-step deadlines.
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Retrieval tool defaults.
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Web search tool defaults.
    #[serde(default)]
    pub web_search: WebSearchSettings,
}

impl std::fmt::Debug for EngineSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSettings")
            .field("provider", &self.provider)
            .field("evaluation", &self.evaluation)
            .field("limits", &self.limits)
            .field("timeouts", &self.timeouts)
            .field("retrieval", &self.retrieval)
            .field("web_search", &self.web_search)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for query embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            embedding_model: default_embedding_model(),
        }
    }
}

/// How the evaluator treats an answer generated with no evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyEvidencePolicy {
    /// No tools ran: trust the model, small bonus.
    #[default]
    Lenient,
    /// A tool-requiring intent produced no evidence: penalize.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Answers scoring below this trigger a retry (while iterations remain).
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    #[serde(default)]
    pub empty_evidence_policy: EmptyEvidencePolicy,
}

fn default_score_threshold() -> f32 {
    0.7
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            empty_evidence_policy: EmptyEvidencePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Maximum user message length in characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// How many prior turns are sent to the model.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_max_message_chars() -> usize {
    10_000
}
fn default_history_window() -> usize {
    10
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Deadline for one tool adapter call.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Deadline for the whole provider request (connect + stream).
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
}

fn default_tool_timeout_secs() -> u64 {
    10
}
fn default_provider_timeout_secs() -> u64 {
    120
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            provider_timeout_secs: default_provider_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Passages scoring below this are dropped.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_top_k() -> usize {
    5
}
fn default_similarity_threshold() -> f64 {
    0.3
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchSettings {
    /// Search endpoint URL. Empty string disables live search.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            max_results: default_max_results(),
        }
    }
}

impl EngineSettings {
    /// Load settings from a TOML file, then apply environment overrides.
    ///
    /// Environment variables checked for the API key, in priority order:
    /// `AGENTFLOW_API_KEY`, `OPENROUTER_API_KEY`, `OPENAI_API_KEY`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!(path = %path.display(), "no settings file found, using defaults");
            Self::default()
        };

        if settings.provider.api_key.is_none() {
            settings.provider.api_key = std::env::var("AGENTFLOW_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(url) = std::env::var("AGENTFLOW_API_URL") {
            settings.provider.api_url = url;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.evaluation.score_threshold) {
            return Err(ConfigError::ValidationError(
                "evaluation.score_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "retrieval.similarity_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.limits.max_message_chars == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_message_chars must be > 0".into(),
            ));
        }

        if self.timeouts.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts.tool_timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            evaluation: EvaluationSettings::default(),
            limits: LimitSettings::default(),
            timeouts: TimeoutSettings::default(),
            retrieval: RetrievalSettings::default(),
            web_search: WebSearchSettings::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse settings file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Settings validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_settings_are_valid() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert!((settings.evaluation.score_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.limits.max_message_chars, 10_000);
    }

    #[test]
    fn settings_roundtrip_toml() {
        let settings = EngineSettings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: EngineSettings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retrieval.top_k, settings.retrieval.top_k);
        assert_eq!(
            parsed.limits.history_window,
            settings.limits.history_window
        );
    }

    #[test]
    fn invalid_threshold_rejected() {
        let settings = EngineSettings {
            evaluation: EvaluationSettings {
                score_threshold: 1.5,
                ..EvaluationSettings::default()
            },
            ..EngineSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_file_returns_defaults() {
        let settings = EngineSettings::load_from(Path::new("/nonexistent/engine.toml")).unwrap();
        assert_eq!(settings.retrieval.top_k, 5);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[evaluation]\nscore_threshold = 0.5\nempty_evidence_policy = \"strict\""
        )
        .unwrap();

        let settings = EngineSettings::load_from(file.path()).unwrap();
        assert!((settings.evaluation.score_threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(
            settings.evaluation.empty_evidence_policy,
            EmptyEvidencePolicy::Strict
        );
        // Untouched sections keep their defaults.
        assert_eq!(settings.timeouts.tool_timeout_secs, 10);
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let settings = EngineSettings {
            provider: ProviderSettings {
                api_key: Some("sk-secret".into()),
                ..ProviderSettings::default()
            },
            ..EngineSettings::default()
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
