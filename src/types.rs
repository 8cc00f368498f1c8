//! Core chat types shared by all provider adapters.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single content part of a multi-part message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },
    /// Reference to an image by URL; the adapter forwards it, it never
    /// fetches or inlines the bytes.
    ImageRef { url: String },
    /// Result of a previously returned tool call.
    ToolResult { tool_call_id: String, content: String },
}

impl ContentPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Message content: plain text or an ordered list of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// All text content, concatenated in order. Non-text parts are skipped.
    pub fn all_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// A message in a conversation.
///
/// Immutable once constructed; the conversation is an ordered `Vec<Message>`
/// owned by the caller and passed in full on every call.
///
/// # Examples
///
/// ```rust
/// use unichat::types::Message;
///
/// let messages = vec![
///     Message::system("You are terse."),
///     Message::user("Hello!"),
/// ];
/// assert_eq!(messages[1].text(), "Hello!");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role
    pub role: MessageRole,
    /// Content: text or multi-part
    pub content: MessageContent,
    /// Tool calls issued by an assistant turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Citations attached to an assistant turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    /// Optional participant name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Creates a system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    fn new<S: Into<String>>(role: MessageRole, content: S) -> Self {
        Self {
            role,
            content: MessageContent::Text(content.into()),
            tool_calls: None,
            citations: None,
            name: None,
        }
    }

    /// Creates a message from explicit content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
            tool_calls: None,
            citations: None,
            name: None,
        }
    }

    /// Attaches tool calls to the message
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = if tool_calls.is_empty() { None } else { Some(tool_calls) };
        self
    }

    /// All text content of the message, concatenated
    pub fn text(&self) -> String {
        self.content.all_text()
    }
}

/// A function-style tool call, complete or partial.
///
/// Streaming providers deliver tool calls in fragments: the first fragment
/// usually carries `id` and `function.name`, later fragments append to
/// `function.arguments`. Fields a fragment does not carry are empty; the
/// decoders never reassemble fragments (see
/// [`StreamCollector`](crate::stream::StreamCollector) for that).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub r#type: String,
    pub function: Option<FunctionCall>,
}

impl ToolCall {
    /// Creates a `function`-typed call.
    pub fn function<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            r#type: "function".to_string(),
            function: Some(FunctionCall { name: name.into(), arguments: arguments.into() }),
        }
    }
}

/// The function half of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// Raw argument JSON; may be an incomplete fragment while streaming
    pub arguments: String,
}

/// A source citation attached to generated content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Citation {
    /// Source URL or document identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The quoted span the citation supports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cited_text: Option<String>,
    /// Start offset of the supported span in the generated text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    /// End offset of the supported span in the generated text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_index: Option<u32>,
}

/// Token accounting for one completed call.
///
/// Populated once at stream end from provider-reported counts; never
/// estimated mid-stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
    /// Estimated cost in USD, when a rate table entry matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

/// Static metadata describing one catalog model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    /// Provider-scoped model id, e.g. `gpt-4o-mini`
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning provider id, e.g. `openai`
    pub provider: String,
    /// Relative speed rating, 1 (slow) to 5 (fast)
    pub speed: u8,
    /// Relative cost rating, 1 (cheap) to 5 (expensive)
    pub cost: u8,
    /// Relative quality rating, 1 to 5
    pub quality: u8,
    /// Context window size in tokens
    pub context_window: u32,
    /// Whether the model accepts tool definitions
    pub supports_tools: bool,
    /// Whether the model accepts image inputs
    pub supports_vision: bool,
    /// Whether the model emits thinking/reasoning deltas
    pub supports_thinking: bool,
}

/// Side-channel observers invoked while a stream is consumed.
///
/// Callbacks run synchronously on the consumer's task, in addition to (not
/// instead of) the yielded events. Keep them cheap.
#[derive(Clone, Default)]
pub struct StreamCallbacks {
    /// Called for every token delta
    pub on_token: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    /// Called for every tool-call fragment
    pub on_tool_call: Option<Arc<dyn Fn(&ToolCall) + Send + Sync>>,
}

impl StreamCallbacks {
    pub(crate) fn notify_token(&self, content: &str) {
        if let Some(cb) = &self.on_token {
            cb(content);
        }
    }

    pub(crate) fn notify_tool_call(&self, tool_call: &ToolCall) {
        if let Some(cb) = &self.on_tool_call {
            cb(tool_call);
        }
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_token", &self.on_token.is_some())
            .field("on_tool_call", &self.on_tool_call.is_some())
            .finish()
    }
}

/// Per-call configuration passed to every adapter operation.
///
/// A plain value object: the adapter reads it during the call and never
/// retains it.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Provider id, e.g. `openai`
    pub provider: String,
    /// Model id, e.g. `gpt-4o-mini`
    pub model: String,
    /// API credential; exposed only while building headers or URLs
    pub api_key: SecretString,
    /// Base URL override; the provider default applies when unset
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Nucleus sampling parameter
    pub top_p: Option<f32>,
    /// Frequency penalty (OpenAI-style providers only)
    pub frequency_penalty: Option<f32>,
    /// Presence penalty (OpenAI-style providers only)
    pub presence_penalty: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
    /// Streaming side-channel observers
    pub callbacks: StreamCallbacks,
}

impl ModelConfig {
    /// Creates a config for `provider`/`model` with no credential set.
    pub fn new<P: Into<String>, M: Into<String>>(provider: P, model: M) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: SecretString::from(String::new()),
            base_url: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop_sequences: None,
            callbacks: StreamCallbacks::default(),
        }
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = SecretString::from(api_key.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = Some(frequency_penalty);
        self
    }

    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.presence_penalty = Some(presence_penalty);
        self
    }

    pub fn with_stop_sequences(mut self, stop_sequences: Vec<String>) -> Self {
        self.stop_sequences = Some(stop_sequences);
        self
    }

    pub fn with_callbacks(mut self, callbacks: StreamCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Resolves the credential: the configured key, else the provider's
    /// environment variable, else empty (the provider will reject it).
    pub(crate) fn api_key_or_env(&self, env_var: &str) -> String {
        let key = self.api_key.expose_secret();
        if !key.is_empty() {
            return key.to_string();
        }
        std::env::var(env_var).unwrap_or_default()
    }
}
