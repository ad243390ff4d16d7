//! Token usage tracking and cost estimation for AgentFlow.
//!
//! Every provider call in an invocation reports its token usage to a
//! `UsageTracker`; at the end of the exchange the tracker produces a
//! `UsageReport` the caller hands to its own usage logging. Costs come
//! from a built-in pricing table with per-model overrides.

pub mod pricing;
pub mod tracker;

pub use pricing::{ModelPricing, PricingTable};
pub use tracker::{UsageReport, UsageTracker};
