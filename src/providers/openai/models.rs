//! OpenAI model catalog and rate table.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::{ModelInfo, TokenUsage};

/// Flagship multimodal model
pub const GPT_4O: &str = "gpt-4o";
/// Small, fast, inexpensive model
pub const GPT_4O_MINI: &str = "gpt-4o-mini";
/// Previous-generation large model
pub const GPT_4_TURBO: &str = "gpt-4-turbo";
/// Legacy small model
pub const GPT_3_5_TURBO: &str = "gpt-3.5-turbo";

/// Rates in USD per 1K tokens. OpenAI quotes per-thousand; keep the
/// published denominator rather than converting.
struct ModelRates {
    input: f64,
    output: f64,
}

lazy_static! {
    static ref RATES: HashMap<&'static str, ModelRates> = {
        let mut rates = HashMap::new();
        rates.insert(GPT_4O, ModelRates { input: 0.0025, output: 0.01 });
        rates.insert(GPT_4O_MINI, ModelRates { input: 0.000_15, output: 0.0006 });
        rates.insert(GPT_4_TURBO, ModelRates { input: 0.01, output: 0.03 });
        rates.insert(GPT_3_5_TURBO, ModelRates { input: 0.0005, output: 0.0015 });
        // Deployment aliases (gateway/Azure-style names) price as the
        // legacy small model.
        rates.insert("default", ModelRates { input: 0.0005, output: 0.0015 });
        rates
    };
    static ref CATALOG: Vec<ModelInfo> = vec![
        entry(GPT_4O, "GPT-4o", 4, 3, 5, 128_000, true, true, false),
        entry(GPT_4O_MINI, "GPT-4o mini", 5, 1, 3, 128_000, true, true, false),
        entry(GPT_4_TURBO, "GPT-4 Turbo", 3, 4, 4, 128_000, true, true, false),
        entry(GPT_3_5_TURBO, "GPT-3.5 Turbo", 5, 1, 2, 16_385, true, false, false),
    ];
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    name: &str,
    speed: u8,
    cost: u8,
    quality: u8,
    context_window: u32,
    supports_tools: bool,
    supports_vision: bool,
    supports_thinking: bool,
) -> ModelInfo {
    ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        provider: "openai".to_string(),
        speed,
        cost,
        quality,
        context_window,
        supports_tools,
        supports_vision,
        supports_thinking,
    }
}

/// Catalog entries, in table order.
pub(crate) fn models() -> Vec<ModelInfo> {
    CATALOG.clone()
}

/// Cost in USD for `usage` under `model_id`. Unknown ids fall back to the
/// `default` entry.
pub(crate) fn estimate_cost(usage: &TokenUsage, model_id: &str) -> f64 {
    let Some(rates) = RATES.get(model_id).or_else(|| RATES.get("default")) else {
        return 0.0;
    };
    f64::from(usage.prompt_tokens) / 1000.0 * rates.input
        + f64::from(usage.completion_tokens) / 1000.0 * rates.output
}
