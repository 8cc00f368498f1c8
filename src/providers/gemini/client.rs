//! Gemini adapter.
//!
//! Talks to the `generateContent` endpoint family. The API key rides as a
//! query parameter, system messages become `systemInstruction`, and
//! streaming goes through `:streamGenerateContent?alt=sse`.

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
use super::streaming::GeminiDecoder;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Adapter for the Google Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    http_client: reqwest::Client,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    /// Uses a caller-supplied HTTP client (proxy, pooling, test server).
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn endpoint(config: &ModelConfig, stream: bool) -> String {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = base_url.trim_end_matches('/');
        let api_key = config.api_key_or_env(API_KEY_ENV);
        let key = urlencoding::encode(&api_key);
        if stream {
            format!(
                "{base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse&key={key}",
                model = config.model
            )
        } else {
            format!(
                "{base_url}/v1beta/models/{model}:generateContent?key={key}",
                model = config.model
            )
        }
    }
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider_id(&self) -> &'static str {
        "gemini"
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        config: &ModelConfig,
    ) -> Result<Message, AdapterError> {
        let body = build_request_body(&messages, config);
        let response = self
            .http_client
            .post(Self::endpoint(config, false))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_body("Gemini", status.as_u16(), &body));
        }

        let chat_response: GeminiChatResponse = response.json().await?;
        parse_chat_response(chat_response)
    }

    fn stream(&self, messages: Vec<Message>, config: &ModelConfig) -> EventStream {
        let body = build_request_body(&messages, config);
        let request = self
            .http_client
            .post(Self::endpoint(config, true))
            .json(&body);

        let model_id = config.model.clone();
        StreamFactory::create_event_stream(
            request,
            GeminiDecoder,
            move |usage| models::estimate_cost(usage, &model_id),
            |status, body| parse_error_body("Gemini", status, body),
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

fn build_request_body(messages: &[Message], config: &ModelConfig) -> Value {
    let (system_instruction, contents) = convert_messages(messages);
    let mut body = json!({ "contents": contents });

    if let Some(map) = body.as_object_mut() {
        if let Some(system) = system_instruction {
            map.insert(
                "systemInstruction".to_string(),
                json!({ "parts": [{ "text": system }] }),
            );
        }
        let mut generation = serde_json::Map::new();
        if let Some(temperature) = config.temperature {
            generation.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = config.max_tokens {
            generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if let Some(top_p) = config.top_p {
            generation.insert("topP".to_string(), json!(top_p));
        }
        if let Some(stop) = &config.stop_sequences {
            generation.insert("stopSequences".to_string(), json!(stop));
        }
        if !generation.is_empty() {
            map.insert("generationConfig".to_string(), Value::Object(generation));
        }
    }
    body
}

fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();
    for message in messages {
        if message.role == MessageRole::System {
            system_parts.push(message.content.all_text());
            continue;
        }
        let role = match message.role {
            MessageRole::Assistant => "model",
            _ => "user",
        };
        let parts = convert_parts(message);
        if parts.is_empty() {
            continue;
        }
        contents.push(json!({ "role": role, "parts": parts }));
    }
    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, contents)
}

fn convert_parts(message: &Message) -> Vec<Value> {
    let mut parts = Vec::new();
    match &message.content {
        MessageContent::Text(text) => {
            if !text.is_empty() {
                parts.push(json!({ "text": text }));
            }
        }
        MessageContent::Parts(content_parts) => {
            for part in content_parts {
                match part {
                    ContentPart::Text { text } => {
                        if !text.is_empty() {
                            parts.push(json!({ "text": text }));
                        }
                    }
                    ContentPart::ImageRef { url } => parts.push(convert_image(url)),
                    ContentPart::ToolResult {
                        tool_call_id,
                        content,
                    } => {
                        // Call ids are function names here, so the id
                        // routes the response back by name. The response
                        // field must be an object.
                        let response = serde_json::from_str::<Value>(content)
                            .ok()
                            .filter(Value::is_object)
                            .unwrap_or_else(|| json!({ "result": content }));
                        parts.push(json!({
                            "functionResponse": {
                                "name": tool_call_id,
                                "response": response,
                            }
                        }));
                    }
                }
            }
        }
    }
    if let Some(tool_calls) = &message.tool_calls {
        for call in tool_calls {
            if let Some(function) = &call.function {
                let args = serde_json::from_str::<Value>(&function.arguments)
                    .unwrap_or_else(|_| json!({}));
                parts.push(json!({
                    "functionCall": { "name": function.name, "args": args }
                }));
            }
        }
    }
    parts
}

fn convert_image(url: &str) -> Value {
    if let Some(data_url) = url.strip_prefix("data:")
        && let Some((mime_type, data)) = data_url.split_once(";base64,")
    {
        return json!({ "inlineData": { "mimeType": mime_type, "data": data } });
    }
    let path = url.split('?').next().unwrap_or(url);
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();
    json!({
        "fileData": { "fileUri": url, "mimeType": mime_type.essence_str() }
    })
}

fn parse_chat_response(response: GeminiChatResponse) -> Result<Message, AdapterError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::ApiError {
            code: 500,
            message: "No candidates in Gemini response".to_string(),
            details: None,
        })?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if part.thought.unwrap_or(false) {
            continue;
        }
        if let Some(part_text) = part.text {
            text.push_str(&part_text);
        }
        if let Some(call) = part.function_call {
            let arguments = call
                .args
                .map(|args| args.to_string())
                .unwrap_or_else(|| "{}".to_string());
            tool_calls.push(ToolCall::function(call.name.clone(), call.name, arguments));
        }
    }

    let mut message = Message::assistant(text);
    if !tool_calls.is_empty() {
        message.tool_calls = Some(tool_calls);
    }
    Ok(message)
}

#[derive(Debug, Deserialize)]
struct GeminiChatResponse {
    #[serde(default)]
    candidates: Vec<GeminiChatCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiChatCandidate {
    content: Option<GeminiChatContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiChatContent {
    #[serde(default)]
    parts: Vec<GeminiChatPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiChatPart {
    text: Option<String>,
    thought: Option<bool>,
    #[serde(rename = "functionCall")]
    function_call: Option<GeminiChatFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiChatFunctionCall {
    name: String,
    args: Option<Value>,
}
