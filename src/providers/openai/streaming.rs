//! OpenAI stream frame decoding.
//!
//! Frames are `data:`-prefixed SSE lines. Decoding is stateless: one frame
//! in, zero or more normalized events out. The `[DONE]` sentinel carries no
//! information (the terminal event comes from the usage-bearing frame) and
//! is ignored.

use serde::Deserialize;

use crate::stream::StreamEvent;
use crate::traits::FrameDecoder;
use crate::types::{FunctionCall, TokenUsage, ToolCall};

/// End-of-stream marker sent after the usage frame.
const DONE_SENTINEL: &str = "[DONE]";

/// OpenAI stream chunk structure
#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    usage: Option<OpenAiStreamUsage>,
}

/// OpenAI stream choice
#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamChoice {
    delta: Option<OpenAiStreamDelta>,
    // Terminal state comes from the usage frame, not finish_reason.
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

/// OpenAI stream delta
#[derive(Debug, Clone)]
struct OpenAiStreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCallDelta>>,
    thinking: Option<String>,
}

impl<'de> serde::Deserialize<'de> for OpenAiStreamDelta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: serde_json::Value = serde_json::Value::deserialize(deserializer)?;

        let content = value
            .get("content")
            .and_then(|v| v.as_str())
            .map(String::from);

        let tool_calls = value
            .get("tool_calls")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        // Reasoning models disagree on the field name.
        let thinking = extract_thinking_field(&value);

        Ok(OpenAiStreamDelta { content, tool_calls, thinking })
    }
}

/// Extracts reasoning text, checking field names in priority order:
/// `reasoning_content` > `thinking` > `reasoning`.
fn extract_thinking_field(value: &serde_json::Value) -> Option<String> {
    ["reasoning_content", "thinking", "reasoning"]
        .iter()
        .find_map(|field| {
            value
                .get(field)
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(String::from)
        })
}

/// OpenAI tool call delta
#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCallDelta {
    #[allow(dead_code)]
    index: Option<usize>,
    id: Option<String>,
    function: Option<OpenAiFunctionDelta>,
}

/// OpenAI function call delta
#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// OpenAI usage information
#[derive(Debug, Clone, Deserialize)]
struct OpenAiStreamUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl OpenAiStreamUsage {
    fn into_token_usage(self) -> TokenUsage {
        let prompt = self.prompt_tokens.unwrap_or(0);
        let completion = self.completion_tokens.unwrap_or(0);
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: self.total_tokens.unwrap_or(prompt + completion),
            estimated_cost: None,
        }
    }
}

/// Stateless decoder for OpenAI-style stream frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiDecoder;

impl FrameDecoder for OpenAiDecoder {
    fn decode_frame(&self, frame: &str) -> Vec<StreamEvent> {
        // Only data lines carry payloads; comments, event names and the
        // blank separator lines are ignored.
        let Some(data) = frame.strip_prefix("data:") else {
            return Vec::new();
        };
        let data = data.trim();
        if data.is_empty() || data == DONE_SENTINEL {
            return Vec::new();
        }

        let chunk: OpenAiStreamChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed OpenAI frame");
                return Vec::new();
            }
        };

        let mut events = Vec::new();

        if let Some(delta) = chunk.choices.first().and_then(|c| c.delta.as_ref()) {
            if let Some(content) = delta.content.as_ref().filter(|c| !c.is_empty()) {
                events.push(StreamEvent::Token { content: content.clone() });
            }

            for tc in delta.tool_calls.iter().flatten() {
                events.push(StreamEvent::ToolCall { tool_call: convert_tool_call_delta(tc) });
            }

            if let Some(thinking) = &delta.thinking {
                events.push(StreamEvent::Thinking { step: thinking.clone() });
            }
        }

        // The final content-bearing frame is followed by one frame whose
        // only payload is usage; that frame is the terminal.
        if let Some(usage) = chunk.usage {
            events.push(StreamEvent::Done { usage: Some(usage.into_token_usage()) });
        }

        events
    }
}

/// Maps one wire fragment to a normalized tool call. Fields the fragment
/// does not carry stay empty; continuation fragments have an empty id.
fn convert_tool_call_delta(delta: &OpenAiToolCallDelta) -> ToolCall {
    ToolCall {
        id: delta.id.clone().unwrap_or_default(),
        r#type: "function".to_string(),
        function: Some(FunctionCall {
            name: delta
                .function
                .as_ref()
                .and_then(|f| f.name.clone())
                .unwrap_or_default(),
            arguments: delta
                .function
                .as_ref()
                .and_then(|f| f.arguments.clone())
                .unwrap_or_default(),
        }),
    }
}
