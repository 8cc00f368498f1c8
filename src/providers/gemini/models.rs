//! Gemini model catalog and rate table.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::{ModelInfo, TokenUsage};

/// Large-context flagship model
pub const GEMINI_1_5_PRO: &str = "gemini-1.5-pro";
/// Fast, inexpensive model
pub const GEMINI_1_5_FLASH: &str = "gemini-1.5-flash";
/// Current-generation fast model
pub const GEMINI_2_0_FLASH: &str = "gemini-2.0-flash";

/// Rates in USD per 1M tokens, matching the published price sheet. No
/// `default` entry: unknown ids price at zero.
struct ModelRates {
    input: f64,
    output: f64,
}

lazy_static! {
    static ref RATES: HashMap<&'static str, ModelRates> = {
        let mut rates = HashMap::new();
        rates.insert(GEMINI_1_5_PRO, ModelRates { input: 1.25, output: 5.0 });
        rates.insert(GEMINI_1_5_FLASH, ModelRates { input: 0.075, output: 0.3 });
        rates.insert(GEMINI_2_0_FLASH, ModelRates { input: 0.1, output: 0.4 });
        rates
    };
    static ref CATALOG: Vec<ModelInfo> = vec![
        entry(GEMINI_1_5_PRO, "Gemini 1.5 Pro", 3, 3, 4, 2_097_152),
        entry(GEMINI_1_5_FLASH, "Gemini 1.5 Flash", 5, 1, 3, 1_048_576),
        entry(GEMINI_2_0_FLASH, "Gemini 2.0 Flash", 5, 1, 4, 1_048_576),
    ];
}

fn entry(id: &str, name: &str, speed: u8, cost: u8, quality: u8, context_window: u32) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        provider: "gemini".to_string(),
        speed,
        cost,
        quality,
        context_window,
        supports_tools: true,
        supports_vision: true,
        supports_thinking: false,
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
