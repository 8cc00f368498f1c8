//! OpenAI adapter.
//!
//! Talks to the Chat Completions endpoint: one-shot `chat`, SSE streaming
//! through the shared line pipeline, and the static catalog in
//! [`super::models`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AdapterError;
use crate::providers::parse_error_body;
use crate::stream::EventStream;
use crate::traits::ProviderAdapter;
use crate::types::{
    ContentPart, Message, MessageContent, ModelConfig, ModelInfo, TokenUsage, ToolCall,
};
use crate::utils::streaming::StreamFactory;

use super::models;
use super::streaming::OpenAiDecoder;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Adapter for the OpenAI Chat Completions API.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    http_client: reqwest::Client,
}

impl OpenAiAdapter {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Uses a caller-supplied HTTP client (proxy, pooling, test server).
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn endpoint(config: &ModelConfig) -> String {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider_id(&self) -> &'static str {
        "openai"
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        config: &ModelConfig,
    ) -> Result<Message, AdapterError> {
        let body = build_request_body(&messages, config, false);
        let response = self
            .http_client
            .post(Self::endpoint(config))
            .bearer_auth(config.api_key_or_env(API_KEY_ENV))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_body("OpenAI", status.as_u16(), &body));
        }

        let chat_response: OpenAiChatResponse = response.json().await?;
        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AdapterError::ApiError {
                code: 500,
                message: "No choices in OpenAI response".to_string(),
                details: None,
            })?;

        let mut message = Message::assistant(choice.message.content.unwrap_or_default());
        if let Some(tool_calls) = choice.message.tool_calls
            && !tool_calls.is_empty()
        {
            message.tool_calls = Some(tool_calls);
        }
        Ok(message)
    }

    fn stream(&self, messages: Vec<Message>, config: &ModelConfig) -> EventStream {
        let body = build_request_body(&messages, config, true);
        let request = self
            .http_client
            .post(Self::endpoint(config))
            .bearer_auth(config.api_key_or_env(API_KEY_ENV))
            .json(&body);

        let model_id = config.model.clone();
        StreamFactory::create_event_stream(
            request,
            OpenAiDecoder,
            move |usage| models::estimate_cost(usage, &model_id),
            |status, body| parse_error_body("OpenAI", status, body),
            config.callbacks.clone(),
        )
    }

    fn estimate_cost(&self, usage: &TokenUsage, model_id: &str) -> f64 {
        models::estimate_cost(usage, model_id)
    }

    fn models(&self) -> Vec<ModelInfo> {
        models::models()
    }
}

fn build_request_body(messages: &[Message], config: &ModelConfig, stream: bool) -> Value {
    let mut body = json!({
        "model": config.model,
        "messages": convert_messages(messages),
    });

    if let Some(map) = body.as_object_mut() {
        if let Some(temperature) = config.temperature {
            map.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = config.max_tokens {
            map.insert("max_tokens".to_string(), json!(max_tokens));
        }
        if let Some(top_p) = config.top_p {
            map.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(frequency_penalty) = config.frequency_penalty {
            map.insert("frequency_penalty".to_string(), json!(frequency_penalty));
        }
        if let Some(presence_penalty) = config.presence_penalty {
            map.insert("presence_penalty".to_string(), json!(presence_penalty));
        }
        if let Some(stop) = &config.stop_sequences {
            map.insert("stop".to_string(), json!(stop));
        }
        if stream {
            map.insert("stream".to_string(), json!(true));
            // Usage only arrives on the final chunk when asked for.
            map.insert(
                "stream_options".to_string(),
                json!({ "include_usage": true }),
            );
        }
    }
    body
}

/// Flattens messages onto the wire. Tool results become their own
/// `role: "tool"` messages, as the API requires.
fn convert_messages(messages: &[Message]) -> Vec<Value> {
    let mut wire = Vec::with_capacity(messages.len());
    for message in messages {
        match &message.content {
            MessageContent::Text(text) => wire.push(wire_message(message, json!(text))),
            MessageContent::Parts(parts) => {
                let mut inline = Vec::new();
                for part in parts {
                    match part {
                        ContentPart::Text { text } => {
                            inline.push(json!({ "type": "text", "text": text }));
                        }
                        ContentPart::ImageRef { url } => {
                            inline.push(json!({
                                "type": "image_url",
                                "image_url": { "url": url },
                            }));
                        }
                        ContentPart::ToolResult {
                            tool_call_id,
                            content,
                        } => {
                            wire.push(json!({
                                "role": "tool",
                                "tool_call_id": tool_call_id,
                                "content": content,
                            }));
                        }
                    }
                }
                if !inline.is_empty() {
                    wire.push(wire_message(message, Value::Array(inline)));
                }
            }
        }
    }
    wire
}

fn wire_message(message: &Message, content: Value) -> Value {
    let mut value = json!({
        "role": message.role,
        "content": content,
    });
    if let Some(map) = value.as_object_mut() {
        if let Some(tool_calls) = &message.tool_calls {
            map.insert("tool_calls".to_string(), json!(tool_calls));
        }
        if let Some(name) = &message.name {
            map.insert("name".to_string(), json!(name));
        }
    }
    value
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatChoice {
    message: OpenAiChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}
