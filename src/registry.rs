//! Provider registry.
//!
//! Maps provider ids to shared adapter instances and aggregates the static
//! model catalogs into one list.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::AdapterError;
use crate::providers::anthropic::AnthropicAdapter;
use crate::providers::gemini::GeminiAdapter;
use crate::providers::openai::OpenAiAdapter;
use crate::traits::ProviderAdapter;
use crate::types::ModelInfo;

struct ProviderRecord {
    id: &'static str,
    adapter: Arc<dyn ProviderAdapter>,
}

lazy_static! {
    static ref PROVIDERS: Vec<ProviderRecord> = vec![
        ProviderRecord {
            id: "openai",
            adapter: Arc::new(OpenAiAdapter::new()),
        },
        ProviderRecord {
            id: "anthropic",
            adapter: Arc::new(AnthropicAdapter::new()),
        },
        ProviderRecord {
            id: "gemini",
            adapter: Arc::new(GeminiAdapter::new()),
        },
    ];
}

/// Looks up the adapter for a provider id.
///
/// Unknown ids are an error, never a silent default.
pub fn get_adapter(provider_id: &str) -> Result<Arc<dyn ProviderAdapter>, AdapterError> {
    PROVIDERS
        .iter()
        .find(|record| record.id == provider_id)
        .map(|record| Arc::clone(&record.adapter))
        .ok_or_else(|| {
            AdapterError::ConfigurationError(format!("Unknown provider: {provider_id}"))
        })
}

/// The combined model catalog across all providers, in registration order.
/// Ids are vendor-namespaced by convention and not de-duplicated.
pub fn all_models() -> Vec<ModelInfo> {
    PROVIDERS
        .iter()
        .flat_map(|record| record.adapter.models())
        .collect()
}

/// Registered provider ids, in registration order.
pub fn provider_ids() -> Vec<&'static str> {
    PROVIDERS.iter().map(|record| record.id).collect()
}
