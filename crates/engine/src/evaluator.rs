//! Answer quality evaluation.
//!
//! A heuristic score in [0, 1] decides whether the loop re-queries.
//! The scoring is pure and infallible by construction: whatever the
//! answer looks like, the evaluator produces a verdict, so a degraded
//! answer can never crash the loop that produced it.

use crate::intent::IntentKind;
use crate::orchestrator::MAX_ITERATIONS;
use agentflow_config::{EmptyEvidencePolicy, EvaluationSettings};
use agentflow_core::tool::{Evidence, ToolInvocation};
use tracing::debug;

/// The evaluator's verdict for one iteration's answer.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Quality score in [0, 1].
    pub score: f32,
    /// Whether the loop should run another iteration.
    pub retry: bool,
    pub rationale: String,
}

/// Words excluded from the query-keyword relevance check.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "what", "how", "why", "when", "where", "who",
    "do", "does", "did", "to", "in", "of", "and", "or", "for", "with", "on", "at", "by", "about",
];

/// Substrings that suggest the answer is reporting a failure.
const ERROR_INDICATORS: &[&str] = &["error", "failed", "unable to", "cannot"];

pub struct Evaluator {
    settings: EvaluationSettings,
}

impl Evaluator {
    pub fn new(settings: EvaluationSettings) -> Self {
        Self { settings }
    }

    /// Score one answer and decide whether to retry.
    ///
    /// Factors: a 0.6 base, character-length bands, an error-indicator
    /// penalty, query-keyword overlap, and an evidence-integration bonus.
    /// The empty-evidence policy applies when the iteration's intent and
    /// its evidence disagree about whether tools helped.
    pub fn evaluate(
        &self,
        query: &str,
        answer: &str,
        intent: IntentKind,
        invocations: &[ToolInvocation],
        evidence: &Evidence,
        iteration: u32,
    ) -> Evaluation {
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Evaluation {
                score: 0.0,
                retry: iteration < MAX_ITERATIONS,
                rationale: "empty answer".into(),
            };
        }

        let mut score: f32 = 0.6;
        let mut factors: Vec<String> = Vec::new();
        let answer_lower = trimmed.to_lowercase();
        let char_count = trimmed.chars().count();

        // Length bands, character-based.
        if char_count < 2 {
            score -= 0.2;
            factors.push("too short (-0.20)".into());
        } else if char_count >= 50 {
            score += 0.2;
            factors.push("substantial length (+0.20)".into());
        } else if char_count >= 10 {
            score += 0.15;
            factors.push("adequate length (+0.15)".into());
        }

        let error_count = ERROR_INDICATORS
            .iter()
            .filter(|ind| answer_lower.contains(*ind))
            .count() as f32;
        if error_count > 0.0 {
            score -= error_count * 0.1;
            factors.push(format!("{error_count} error indicators (-{:.2})", error_count * 0.1));
        }

        // Relevance: how many content words of the query made it into the
        // answer.
        let query_lower = query.to_lowercase();
        let keywords: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|w| !STOPWORDS.contains(w))
            .collect();
        if !keywords.is_empty() {
            let overlap = keywords
                .iter()
                .filter(|kw| answer_lower.contains(*kw))
                .count();
            let ratio = overlap as f32 / keywords.len() as f32;
            score += ratio * 0.2;
            factors.push(format!("keyword overlap {overlap}/{} (+{:.2})", keywords.len(), ratio * 0.2));
        }

        let any_success = invocations
            .iter()
            .any(|i| i.status == agentflow_core::tool::InvocationStatus::Completed);
        if any_success && char_count > 20 {
            score += 0.1;
            factors.push("tool evidence integrated (+0.10)".into());
        }

        match self.settings.empty_evidence_policy {
            EmptyEvidencePolicy::Lenient => {
                if invocations.is_empty() {
                    score += 0.05;
                    factors.push("no tools needed (+0.05)".into());
                }
            }
            EmptyEvidencePolicy::Strict => {
                if intent.requires_tools() && evidence.is_empty() {
                    score -= 0.15;
                    factors.push("tool intent produced no evidence (-0.15)".into());
                }
            }
        }

        let score = score.clamp(0.0, 1.0);
        let retry = score < self.settings.score_threshold && iteration < MAX_ITERATIONS;

        debug!(score, retry, iteration, "evaluated answer");
        Evaluation {
            score,
            retry,
            rationale: factors.join("; "),
        }
    }
}
