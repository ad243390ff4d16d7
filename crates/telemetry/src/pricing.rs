//! Built-in pricing table for common LLM models.
//!
//! Prices are in USD per 1 million tokens. Each model has an input and
//! output price. Custom pricing can be added at runtime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    /// Create a new pricing entry.
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 * self.input_per_m + output_tokens as f64 * self.output_per_m)
            / 1_000_000.0
    }
}

/// Thread-safe pricing table with built-in defaults and custom overrides.
pub struct PricingTable {
    prices: RwLock<HashMap<String, ModelPricing>>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        // ── Anthropic ──────────────────────────────────────────────
        prices.insert(
            "anthropic/claude-sonnet-4".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "anthropic/claude-3.5-sonnet".into(),
            ModelPricing::new(3.0, 15.0),
        );
        prices.insert(
            "anthropic/claude-3.5-haiku".into(),
            ModelPricing::new(0.8, 4.0),
        );

        // ── OpenAI ─────────────────────────────────────────────────
        prices.insert("openai/gpt-4o".into(), ModelPricing::new(2.5, 10.0));
        prices.insert("openai/gpt-4o-mini".into(), ModelPricing::new(0.15, 0.6));
        prices.insert("openai/o3-mini".into(), ModelPricing::new(1.1, 4.4));
        prices.insert(
            "openai/text-embedding-3-small".into(),
            ModelPricing::new(0.02, 0.0),
        );

        // ── Google ─────────────────────────────────────────────────
        prices.insert(
            "google/gemini-2.0-flash".into(),
            ModelPricing::new(0.1, 0.4),
        );
        prices.insert("google/gemini-1.5-pro".into(), ModelPricing::new(1.25, 5.0));

        // ── Meta (via OpenRouter) ──────────────────────────────────
        prices.insert(
            "meta-llama/llama-3.1-70b".into(),
            ModelPricing::new(0.52, 0.75),
        );
        prices.insert(
            "meta-llama/llama-3.1-8b".into(),
            ModelPricing::new(0.055, 0.055),
        );

        // ── Mistral ────────────────────────────────────────────────
        prices.insert("mistral/mistral-large".into(), ModelPricing::new(2.0, 6.0));
        prices.insert("mistral/mistral-small".into(), ModelPricing::new(0.2, 0.6));

        // ── DeepSeek ───────────────────────────────────────────────
        prices.insert("deepseek/deepseek-v3".into(), ModelPricing::new(0.27, 1.1));

        Self {
            prices: RwLock::new(prices),
        }
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Look up pricing for a model. Returns None if not found.
    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        let prices = self.prices.read().unwrap();
        prices.get(model).cloned()
    }

    /// Add or update pricing for a model.
    pub fn set(&self, model: impl Into<String>, pricing: ModelPricing) {
        let mut prices = self.prices.write().unwrap();
        prices.insert(model.into(), pricing);
    }

    /// Compute cost for a model call, returning 0.0 if model is not in table.
    ///
    /// Supports flexible matching: tries exact match first, then common
    /// provider prefixes (`gpt-4o` → `openai/gpt-4o`), then prefix matching
    /// (`gpt-4o-mini-2024-07-18` matches `gpt-4o-mini`).
    pub fn compute_cost(&self, model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
        let prices = self.prices.read().unwrap();

        // 1. Exact match
        if let Some(p) = prices.get(model) {
            return p.cost(input_tokens, output_tokens);
        }

        // 2. Try with common provider prefixes
        let prefixed_names = [
            format!("openai/{}", model),
            format!("anthropic/{}", model),
            format!("google/{}", model),
            format!("mistral/{}", model),
            format!("deepseek/{}", model),
            format!("meta-llama/{}", model),
        ];
        for name in &prefixed_names {
            if let Some(p) = prices.get(name.as_str()) {
                return p.cost(input_tokens, output_tokens);
            }
        }

        // 3. Prefix match: model responses often carry a version suffix
        //    e.g. "gpt-4o-mini-2024-07-18" should match "gpt-4o-mini"
        let model_lower = model.to_lowercase();
        let bare_model = model_lower.split('/').next_back().unwrap_or(&model_lower);

        // Find the longest bare key that is a prefix of the model's bare name
        let mut best: Option<(usize, &ModelPricing)> = None;
        for (key, pricing) in prices.iter() {
            let bare_key = key.split('/').next_back().unwrap_or(key).to_lowercase();
            if bare_model.starts_with(&bare_key)
                && best.map_or(true, |(len, _)| bare_key.len() > len)
            {
                best = Some((bare_key.len(), pricing));
            }
        }

        if let Some((_, p)) = best {
            return p.cost(input_tokens, output_tokens);
        }

        0.0
    }

    /// List all known model names.
    pub fn models(&self) -> Vec<String> {
        let prices = self.prices.read().unwrap();
        let mut names: Vec<String> = prices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of models in the pricing table.
    pub fn len(&self) -> usize {
        self.prices.read().unwrap().len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
