//! Capability traits implemented by every provider adapter.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::stream::{EventStream, StreamEvent};
use crate::types::{Message, ModelConfig, ModelInfo, TokenUsage};

/// The uniform surface of one vendor adapter: one-shot chat, streaming
/// chat, and cost estimation, plus its static model catalog.
///
/// Adapters are stateless values; every call carries its own
/// [`ModelConfig`] and adapters never retain it.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Registry id of this provider, e.g. `"openai"`.
    fn provider_id(&self) -> &'static str;

    /// Sends one non-streaming completion request and returns the
    /// assistant message.
    async fn chat(
        &self,
        messages: Vec<Message>,
        config: &ModelConfig,
    ) -> Result<Message, AdapterError>;

    /// Composes request, line framing and frame decoding into a lazy
    /// event stream. No I/O happens until the stream is first polled;
    /// transport failures surface as a single in-band
    /// [`StreamEvent::Error`].
    fn stream(&self, messages: Vec<Message>, config: &ModelConfig) -> EventStream;

    /// Estimated cost in USD for `usage` under `model_id`'s rate entry.
    /// Unknown models cost `0.0`; this never errors.
    fn estimate_cost(&self, usage: &TokenUsage, model_id: &str) -> f64;

    /// Static catalog entries for this provider's models.
    fn models(&self) -> Vec<ModelInfo>;
}

/// Maps one wire frame to zero or more normalized events.
///
/// Implementations are stateless: a frame either stands alone or it does
/// not, and partial fragments are emitted as-is. A malformed frame decodes
/// to nothing (logged, never fatal).
pub trait FrameDecoder: Send + Sync {
    fn decode_frame(&self, frame: &str) -> Vec<StreamEvent>;
}
