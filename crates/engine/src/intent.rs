//! Intent classification.
//!
//! A keyword-scoring heuristic decides which tool family a query calls
//! for. It makes no provider call and has no failure mode. On
//! re-query iterations the scores are biased toward the tool family not
//! yet tried, so retries can escalate instead of repeating themselves.

use agentflow_core::agent::ToolKind;
use agentflow_core::tool::ToolInvocation;
use tracing::debug;

/// Which tool family a query calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    /// Plain conversation, no tools.
    General,
    /// Knowledge-base lookup.
    Retrieval,
    /// Live web search.
    WebSearch,
    /// Both retrieval and web search.
    Hybrid,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::General => "general",
            IntentKind::Retrieval => "retrieval",
            IntentKind::WebSearch => "web_search",
            IntentKind::Hybrid => "hybrid",
        }
    }

    /// Whether this intent dispatches the tool executor at all.
    pub fn requires_tools(&self) -> bool {
        !matches!(self, IntentKind::General)
    }
}

/// A classification verdict.
#[derive(Debug, Clone)]
pub struct Intent {
    pub kind: IntentKind,
    /// Heuristic confidence in [0, 1].
    pub confidence: f32,
    pub rationale: String,
}

/// Indicators that the user wants something from uploaded knowledge.
const RETRIEVAL_KEYWORDS: &[&str] = &[
    "document",
    "file",
    "uploaded",
    "content",
    "search",
    "find",
    "according to",
    "based on",
    "knowledge base",
];

/// Indicators that the user wants fresh information from the web.
const WEB_KEYWORDS: &[&str] = &[
    "latest",
    "news",
    "current",
    "today",
    "weather",
    "real-time",
    "what is",
    "who is",
    "how to",
];

/// Classify one query.
///
/// `prior` holds the invocations from earlier iterations of the same
/// exchange and `prior_rationale` the evaluator's verdict on the last
/// attempt; both only exist on re-query iterations. `enabled` is the set
/// of tool kinds the agent actually has. Intents whose kind is not enabled
/// are downgraded rather than emitted, so the executor never selects a
/// tool the agent lacks.
pub fn classify(
    query: &str,
    prior: &[ToolInvocation],
    prior_rationale: Option<&str>,
    enabled: &[ToolKind],
) -> Intent {
    let query_lower = query.to_lowercase();

    let mut retrieval_score = count_matches(&query_lower, RETRIEVAL_KEYWORDS);
    let mut web_score = count_matches(&query_lower, WEB_KEYWORDS);

    // Re-query bias: prefer the family we have not tried yet.
    let tried_retrieval = prior.iter().any(|i| i.kind == ToolKind::Retrieval);
    let tried_web = prior.iter().any(|i| i.kind == ToolKind::WebSearch);
    if tried_retrieval && !tried_web {
        web_score += 2;
    } else if tried_web && !tried_retrieval {
        retrieval_score += 2;
    }

    let raw = if retrieval_score > 0 && web_score > 0 {
        Intent {
            kind: IntentKind::Hybrid,
            confidence: 0.7,
            rationale: format!(
                "query contains both knowledge ({retrieval_score}) and web ({web_score}) indicators"
            ),
        }
    } else if retrieval_score > web_score {
        Intent {
            kind: IntentKind::Retrieval,
            confidence: scaled_confidence(retrieval_score),
            rationale: format!("query contains {retrieval_score} knowledge search indicators"),
        }
    } else if web_score > retrieval_score {
        Intent {
            kind: IntentKind::WebSearch,
            confidence: scaled_confidence(web_score),
            rationale: format!("query contains {web_score} web search indicators"),
        }
    } else {
        Intent {
            kind: IntentKind::General,
            confidence: 0.8,
            rationale: "no tool indicators found, treating as general conversation".into(),
        }
    };

    let mut intent = downgrade(raw, enabled);
    if let Some(reason) = prior_rationale {
        intent.rationale = format!("{}; previous attempt: {reason}", intent.rationale);
    }
    debug!(
        intent = intent.kind.as_str(),
        confidence = intent.confidence,
        "classified intent"
    );
    intent
}

fn count_matches(query_lower: &str, keywords: &[&str]) -> u32 {
    keywords.iter().filter(|kw| query_lower.contains(*kw)).count() as u32
}

fn scaled_confidence(score: u32) -> f32 {
    (0.5 + score as f32 * 0.1).min(0.95)
}

/// Drop the intent down to what the agent's enabled tools can serve.
fn downgrade(intent: Intent, enabled: &[ToolKind]) -> Intent {
    let has_retrieval = enabled.contains(&ToolKind::Retrieval);
    let has_web = enabled.contains(&ToolKind::WebSearch);

    let target = match intent.kind {
        IntentKind::General => return intent,
        IntentKind::Retrieval if has_retrieval => return intent,
        IntentKind::WebSearch if has_web => return intent,
        IntentKind::Hybrid if has_retrieval && has_web => return intent,
        IntentKind::Hybrid if has_retrieval => IntentKind::Retrieval,
        IntentKind::Hybrid if has_web => IntentKind::WebSearch,
        _ => IntentKind::General,
    };

    Intent {
        kind: target,
        confidence: intent.confidence,
        rationale: format!(
            "{} (downgraded from {}: tool kind not enabled)",
            intent.rationale,
            intent.kind.as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ToolKind] = &[ToolKind::Retrieval, ToolKind::WebSearch, ToolKind::CustomHttp];

    fn invocation(kind: ToolKind) -> ToolInvocation {
        ToolInvocation::started(kind, "t", "q")
    }

    #[test]
    fn plain_chat_is_general() {
        let intent = classify("hello there", &[], None, ALL);
        assert_eq!(intent.kind, IntentKind::General);
        assert!((intent.confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn document_query_is_retrieval() {
        let intent = classify("find the uploaded document about pricing", &[], None, ALL);
        assert_eq!(intent.kind, IntentKind::Retrieval);
        assert!(intent.confidence > 0.5);
    }

    #[test]
    fn news_query_is_web_search() {
        let intent = classify("latest news today", &[], None, ALL);
        assert_eq!(intent.kind, IntentKind::WebSearch);
    }

    #[test]
    fn mixed_query_is_hybrid() {
        let intent = classify("search the document for the latest figures", &[], None, ALL);
        assert_eq!(intent.kind, IntentKind::Hybrid);
        assert!((intent.confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn confidence_capped() {
        let query = "search find document file uploaded content according to based on";
        let intent = classify(query, &[], None, ALL);
        assert!(intent.confidence <= 0.95);
    }

    #[test]
    fn requery_biases_toward_untried_family() {
        // A retrieval-leaning query, but retrieval was already tried.
        let prior = vec![invocation(ToolKind::Retrieval)];
        let intent = classify("find the document", &prior, None, ALL);
        // +2 web bias makes both sides positive.
        assert_eq!(intent.kind, IntentKind::Hybrid);
    }

    #[test]
    fn requery_after_web_biases_retrieval() {
        let prior = vec![invocation(ToolKind::WebSearch)];
        let intent = classify("what happened", &prior, None, ALL);
        assert_eq!(intent.kind, IntentKind::Retrieval);
    }

    #[test]
    fn disabled_kind_downgrades_to_general() {
        let intent = classify("find the uploaded document", &[], None, &[ToolKind::WebSearch]);
        assert_eq!(intent.kind, IntentKind::General);
        assert!(intent.rationale.contains("downgraded"));
    }

    #[test]
    fn hybrid_downgrades_to_enabled_half() {
        let query = "search the document for the latest figures";
        let intent = classify(query, &[], None, &[ToolKind::Retrieval]);
        assert_eq!(intent.kind, IntentKind::Retrieval);

        let intent = classify(query, &[], None, &[ToolKind::WebSearch]);
        assert_eq!(intent.kind, IntentKind::WebSearch);
    }

    #[test]
    fn no_enabled_tools_never_requires_tools() {
        let intent = classify("find the latest news in the uploaded file", &[], None, &[]);
        assert!(!intent.kind.requires_tools());
    }

    #[test]
    fn requery_rationale_carries_prior_verdict() {
        let intent = classify("hello there", &[], Some("answer too short"), ALL);
        assert_eq!(intent.kind, IntentKind::General);
        assert!(intent.rationale.contains("answer too short"));
    }

    #[test]
    fn custom_http_alone_does_not_enable_tool_intents() {
        let intent = classify("find the document", &[], None, &[ToolKind::CustomHttp]);
        assert_eq!(intent.kind, IntentKind::General);
    }
}
