//! Anthropic model catalog and rate table.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::{ModelInfo, TokenUsage};

/// Balanced flagship model
pub const CLAUDE_3_5_SONNET: &str = "claude-3-5-sonnet-20241022";
/// Fast, inexpensive model
pub const CLAUDE_3_5_HAIKU: &str = "claude-3-5-haiku-20241022";
/// Highest-capability model
pub const CLAUDE_3_OPUS: &str = "claude-3-opus-20240229";

/// Rates in USD per 1M tokens, matching the published price sheet. No
/// `default` entry: unknown ids price at zero.
struct ModelRates {
    input: f64,
    output: f64,
}

lazy_static! {
    static ref RATES: HashMap<&'static str, ModelRates> = {
        let mut rates = HashMap::new();
        rates.insert(CLAUDE_3_5_SONNET, ModelRates { input: 3.0, output: 15.0 });
        rates.insert(CLAUDE_3_5_HAIKU, ModelRates { input: 0.8, output: 4.0 });
        rates.insert(CLAUDE_3_OPUS, ModelRates { input: 15.0, output: 75.0 });
        rates
    };
    static ref CATALOG: Vec<ModelInfo> = vec![
        entry(CLAUDE_3_5_SONNET, "Claude 3.5 Sonnet", 4, 3, 5, true, true, true),
        entry(CLAUDE_3_5_HAIKU, "Claude 3.5 Haiku", 5, 1, 3, true, true, false),
        entry(CLAUDE_3_OPUS, "Claude 3 Opus", 2, 5, 5, true, true, false),
    ];
}

fn entry(
    id: &str,
    name: &str,
    speed: u8,
    cost: u8,
    quality: u8,
    supports_tools: bool,
    supports_vision: bool,
    supports_thinking: bool,
) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        provider: "anthropic".to_string(),
        speed,
        cost,
        quality,
        context_window: 200_000,
        supports_tools,
        supports_vision,
        supports_thinking,
    }
}

/// Catalog entries, in table order.
pub(crate) fn models() -> Vec<ModelInfo> {
    CATALOG.clone()
}

/// Cost in USD for `usage` under `model_id`. Unknown ids cost `0.0`.
pub(crate) fn estimate_cost(usage: &TokenUsage, model_id: &str) -> f64 {
    let Some(rates) = RATES.get(model_id) else {
        return 0.0;
    };
    f64::from(usage.prompt_tokens) / 1_000_000.0 * rates.input
        + f64::from(usage.completion_tokens) / 1_000_000.0 * rates.output
}
