//! # Unichat - Unified Streaming Chat Adapters
//!
//! Unichat puts one event vocabulary over the OpenAI, Anthropic and Gemini
//! chat APIs. A chat UI consumes [`StreamEvent`]s and never learns which
//! vendor produced them.
//!
#![deny(unsafe_code)]
//! ## Features
//!
//! - **One Event Vocabulary**: `Token`, `ToolCall`, `Thinking` and `Citation`
//!   events, closed by exactly one `Done` or `Error` per stream.
//! - **State-Free Decoders**: every wire frame maps to events on its own;
//!   malformed frames are logged and swallowed, never fatal.
//! - **Lazy Streaming**: the request goes out when the stream is first
//!   polled, and dropping the stream releases the transport.
//! - **Cost Estimation**: static per-model rate tables attach an estimated
//!   cost to the final usage report.
//! - **Tolerant Parsing**: longest-parsable-prefix recovery for structured
//!   payloads that arrive half-finished.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unichat::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = get_adapter("anthropic")?;
//!     let config = ModelConfig::new("anthropic", "claude-3-5-sonnet-20241022")
//!         .with_api_key("your-api-key");
//!
//!     let mut stream = adapter.stream(vec![Message::user("Hello!")], &config);
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             StreamEvent::Token { content } => print!("{content}"),
//!             StreamEvent::Done { usage } => println!("\n{usage:?}"),
//!             StreamEvent::Error { message } => eprintln!("error: {message}"),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Messages, content parts, configuration and catalog entries |
//! | [`stream`] | The [`StreamEvent`] union and the [`StreamCollector`] |
//! | [`traits`] | The [`ProviderAdapter`] and [`FrameDecoder`] seams |
//! | [`providers`] | OpenAI, Anthropic and Gemini adapters |
//! | [`registry`] | Provider lookup and the combined model catalog |
//! | [`partial_json`] | Tolerant parsing for incomplete JSON payloads |
//! | [`error`] | The unified [`AdapterError`] type |

pub mod error;
pub mod partial_json;
pub mod providers;
pub mod registry;
pub mod stream;
pub mod traits;
pub mod types;

pub(crate) mod utils;

pub use error::AdapterError;
pub use partial_json::{PartialJson, parse_partial_json};
pub use providers::anthropic::AnthropicAdapter;
pub use providers::gemini::GeminiAdapter;
pub use providers::openai::OpenAiAdapter;
pub use registry::{all_models, get_adapter};
pub use stream::{EventStream, StreamCollector, StreamEvent};
pub use traits::{FrameDecoder, ProviderAdapter};
pub use types::{
    Citation, ContentPart, FunctionCall, Message, MessageContent, MessageRole, ModelConfig,
    ModelInfo, StreamCallbacks, TokenUsage, ToolCall,
};

/// Convenient pre-import module
pub mod prelude {
    pub use futures_util::StreamExt;

    pub use crate::error::AdapterError;
    pub use crate::partial_json::{PartialJson, parse_partial_json};
    pub use crate::registry::{all_models, get_adapter};
    pub use crate::stream::{EventStream, StreamCollector, StreamEvent};
    pub use crate::traits::ProviderAdapter;
    pub use crate::types::{
        Citation, ContentPart, FunctionCall, Message, MessageContent, MessageRole, ModelConfig,
        ModelInfo, StreamCallbacks, TokenUsage, ToolCall,
    };
}
