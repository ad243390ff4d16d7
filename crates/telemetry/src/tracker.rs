//! Per-invocation usage tracking.
//!
//! One `UsageTracker` lives for the duration of one engine invocation. It
//! accumulates token usage across every provider call (classification is
//! heuristic and free; generation and embeddings are not), checks the
//! caller-supplied token budget, and produces the final `UsageReport`.

use crate::pricing::PricingTable;
use agentflow_core::error::EngineError;
use agentflow_core::provider::Usage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Instant;
use tracing::debug;

/// Aggregate usage for one finished invocation, handed to the caller for
/// external usage logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReport {
    pub model: String,
    pub usage: Usage,
    pub cost_usd: f64,
    pub provider_calls: u32,
    pub elapsed_ms: u64,
    /// When the invocation closed out, for external usage logs.
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Totals {
    usage: Usage,
    provider_calls: u32,
}

/// Thread-safe usage accumulator for a single invocation.
pub struct UsageTracker {
    pricing: Arc<PricingTable>,
    model: String,
    started: Instant,
    totals: RwLock<Totals>,
}

impl UsageTracker {
    pub fn new(pricing: Arc<PricingTable>, model: impl Into<String>) -> Self {
        Self {
            pricing,
            model: model.into(),
            started: Instant::now(),
            totals: RwLock::new(Totals::default()),
        }
    }

    /// Record one provider call's usage.
    pub fn record(&self, usage: Usage) {
        let mut totals = self.totals.write().unwrap();
        totals.usage.absorb(usage);
        totals.provider_calls += 1;
        debug!(
            total_tokens = totals.usage.total_tokens,
            provider_calls = totals.provider_calls,
            "recorded provider usage"
        );
    }

    /// Tokens consumed so far.
    pub fn total_usage(&self) -> Usage {
        self.totals.read().unwrap().usage
    }

    /// Estimated spend so far.
    pub fn cost_usd(&self) -> f64 {
        let usage = self.total_usage();
        self.pricing
            .compute_cost(&self.model, usage.prompt_tokens, usage.completion_tokens)
    }

    /// Abort check against the caller-supplied token budget.
    pub fn check_budget(&self, quota: Option<u64>) -> Result<(), EngineError> {
        let Some(budget) = quota else {
            return Ok(());
        };
        let used = self.total_usage().total_tokens as u64;
        if used >= budget {
            return Err(EngineError::BudgetExhausted { used, budget });
        }
        Ok(())
    }

    /// Close out the invocation.
    pub fn finish(&self) -> UsageReport {
        let totals = self.totals.read().unwrap();
        let cost_usd = self.pricing.compute_cost(
            &self.model,
            totals.usage.prompt_tokens,
            totals.usage.completion_tokens,
        );
        UsageReport {
            model: self.model.clone(),
            usage: totals.usage,
            cost_usd,
            provider_calls: totals.provider_calls,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        }
    }
}
