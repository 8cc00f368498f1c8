//! Anthropic adapter.
//!
//! Talks to the Messages API. System messages are lifted out of the
//! conversation into the top-level `system` field, and `max_tokens` is
//! always sent because the API refuses requests without it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AdapterError;
use crate::providers::parse_error_body;
use crate::stream::EventStream;
use crate::traits::ProviderAdapter;
use crate::types::{
    ContentPart, Message, MessageContent, MessageRole, ModelConfig, ModelInfo, TokenUsage, ToolCall,
};
use crate::utils::streaming::StreamFactory;

use super::models;
use super::streaming::AnthropicDecoder;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Adapter for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    http_client: reqwest::Client,
}

impl AnthropicAdapter {
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
        format!("{}/v1/messages", base_url.trim_end_matches('/'))
    }

    fn request(&self, config: &ModelConfig, body: &Value) -> reqwest::RequestBuilder {
        self.http_client
            .post(Self::endpoint(config))
            .header("x-api-key", config.api_key_or_env(API_KEY_ENV))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
    }
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider_id(&self) -> &'static str {
        "anthropic"
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        config: &ModelConfig,
    ) -> Result<Message, AdapterError> {
        let body = build_request_body(&messages, config, false);
        let response = self.request(config, &body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_body("Anthropic", status.as_u16(), &body));
        }

        let chat_response: AnthropicChatResponse = response.json().await?;
        Ok(parse_chat_response(chat_response))
    }

    fn stream(&self, messages: Vec<Message>, config: &ModelConfig) -> EventStream {
        let body = build_request_body(&messages, config, true);
        let request = self.request(config, &body);

        let model_id = config.model.clone();
        StreamFactory::create_event_stream(
            request,
            AnthropicDecoder,
            move |usage| models::estimate_cost(usage, &model_id),
            |status, body| parse_error_body("Anthropic", status, body),
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
    let (system, wire_messages) = split_system(messages);
    let mut body = json!({
        "model": config.model,
        "max_tokens": config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": wire_messages,
    });

    if let Some(map) = body.as_object_mut() {
        if let Some(system) = system {
            map.insert("system".to_string(), json!(system));
        }
        if let Some(temperature) = config.temperature {
            map.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(top_p) = config.top_p {
            map.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(stop) = &config.stop_sequences {
            map.insert("stop_sequences".to_string(), json!(stop));
        }
        if stream {
            map.insert("stream".to_string(), json!(true));
        }
    }
    body
}

/// Lifts system messages out of the conversation; the Messages API takes
/// them as a top-level field, not as turns.
fn split_system(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut wire = Vec::new();
    for message in messages {
        if message.role == MessageRole::System {
            system_parts.push(message.content.all_text());
            continue;
        }
        wire.push(json!({
            "role": message.role,
            "content": convert_content(message),
        }));
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, wire)
}

fn convert_content(message: &Message) -> Value {
    let mut blocks = Vec::new();
    match &message.content {
        MessageContent::Text(text) => {
            if message.tool_calls.is_none() {
                return json!(text);
            }
            if !text.is_empty() {
                blocks.push(json!({ "type": "text", "text": text }));
            }
        }
        MessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text } => {
                        blocks.push(json!({ "type": "text", "text": text }));
                    }
                    ContentPart::ImageRef { url } => {
                        blocks.push(json!({
                            "type": "image",
                            "source": { "type": "url", "url": url },
                        }));
                    }
                    ContentPart::ToolResult {
                        tool_call_id,
                        content,
                    } => {
                        blocks.push(json!({
                            "type": "tool_result",
                            "tool_use_id": tool_call_id,
                            "content": content,
                        }));
                    }
                }
            }
        }
    }
    if let Some(tool_calls) = &message.tool_calls {
        for call in tool_calls {
            let name = call
                .function
                .as_ref()
                .map(|f| f.name.clone())
                .unwrap_or_default();
            let input = call
                .function
                .as_ref()
                .and_then(|f| serde_json::from_str::<Value>(&f.arguments).ok())
                .unwrap_or_else(|| json!({}));
            blocks.push(json!({
                "type": "tool_use",
                "id": call.id,
                "name": name,
                "input": input,
            }));
        }
    }
    Value::Array(blocks)
}

fn parse_chat_response(response: AnthropicChatResponse) -> Message {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in response.content {
        match block.block_type.as_str() {
            "text" => {
                if let Some(block_text) = block.text {
                    text.push_str(&block_text);
                }
            }
            "tool_use" => {
                let arguments = block
                    .input
                    .map(|input| input.to_string())
                    .unwrap_or_else(|| "{}".to_string());
                tool_calls.push(ToolCall::function(
                    block.id.unwrap_or_default(),
                    block.name.unwrap_or_default(),
                    arguments,
                ));
            }
            _ => {}
        }
    }

    let mut message = Message::assistant(text);
    if !tool_calls.is_empty() {
        message.tool_calls = Some(tool_calls);
    }
    message
}

#[derive(Debug, Deserialize)]
struct AnthropicChatResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
    id: Option<String>,
    name: Option<String>,
    input: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_body_lifts_system() {
        let config = ModelConfig::new("anthropic", "claude-3-5-sonnet-20241022");
        let messages = vec![
            Message::system("Be terse."),
            Message::user("hi"),
            Message::system("Answer in French."),
        ];
        let body = build_request_body(&messages, &config, false);

        assert_eq!(body["system"], "Be terse.\n\nAnswer in French.");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_build_request_body_always_sends_max_tokens() {
        let config = ModelConfig::new("anthropic", "claude-3-5-haiku-20241022");
        let body = build_request_body(&[Message::user("hi")], &config, false);
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);

        let config = config.with_max_tokens(512);
        let body = build_request_body(&[Message::user("hi")], &config, true);
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_convert_content_tool_result_block() {
        let message = Message::with_parts(
            MessageRole::User,
            vec![ContentPart::ToolResult {
                tool_call_id: "toolu_1".to_string(),
                content: "sunny".to_string(),
            }],
        );
        let content = convert_content(&message);

        assert_eq!(content[0]["type"], "tool_result");
        assert_eq!(content[0]["tool_use_id"], "toolu_1");
        assert_eq!(content[0]["content"], "sunny");
    }

    #[test]
    fn test_convert_content_assistant_tool_calls() {
        let message = Message::assistant("checking").with_tool_calls(vec![ToolCall::function(
            "toolu_1",
            "get_weather",
            r#"{"city":"Paris"}"#,
        )]);
        let content = convert_content(&message);

        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "tool_use");
        assert_eq!(content[1]["name"], "get_weather");
        assert_eq!(content[1]["input"]["city"], "Paris");
    }

    #[test]
    fn test_parse_chat_response_text_and_tools() {
        let response: AnthropicChatResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "text", "text": "Let me check."},
                    {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Paris"}}
                ]
            }"#,
        )
        .unwrap();
        let message = parse_chat_response(response);

        assert_eq!(message.text(), "Let me check.");
        let tool_calls = message.tool_calls.unwrap();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(
            tool_calls[0].function.as_ref().unwrap().name,
            "get_weather"
        );
        assert_eq!(
            tool_calls[0].function.as_ref().unwrap().arguments,
            r#"{"city":"Paris"}"#
        );
    }

    #[test]
    fn test_endpoint_respects_base_url_override() {
        let config = ModelConfig::new("anthropic", "claude-3-opus-20240229")
            .with_base_url("http://localhost:9000");
        assert_eq!(
            AnthropicAdapter::endpoint(&config),
            "http://localhost:9000/v1/messages"
        );
    }
}
