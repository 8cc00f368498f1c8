//! Gemini stream frame decoding.
//!
//! Frames are raw JSON lines, `data:`-prefixed when the SSE variant of
//! `streamGenerateContent` is used. There is no end-marker frame: the
//! terminal comes from the candidate that carries a `finishReason`, and
//! the wire simply closes afterwards.

use serde::Deserialize;

use crate::stream::StreamEvent;
use crate::traits::FrameDecoder;
use crate::types::{TokenUsage, ToolCall};

/// Gemini stream chunk structure
#[derive(Debug, Clone, Deserialize)]
struct GeminiStreamChunk {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

/// Gemini candidate structure
#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

/// Gemini content structure
#[derive(Debug, Clone, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
    #[allow(dead_code)]
    // Always "model" on stream candidates
    role: Option<String>,
}

/// Gemini part structure
#[derive(Debug, Clone, Deserialize)]
struct GeminiPart {
    text: Option<String>,
    /// Set on thought-summary parts from thinking models
    thought: Option<bool>,
    #[serde(rename = "functionCall")]
    function_call: Option<GeminiFunctionCall>,
}

/// Gemini function call structure; arrives complete, never fragmented.
#[derive(Debug, Clone, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}

/// Gemini usage metadata
#[derive(Debug, Clone, Deserialize)]
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

impl GeminiUsageMetadata {
    fn into_token_usage(self) -> TokenUsage {
        let prompt = self.prompt_token_count.unwrap_or(0);
        let completion = self.candidates_token_count.unwrap_or(0);
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: self.total_token_count.unwrap_or(prompt + completion),
            estimated_cost: None,
        }
    }
}

/// Stateless decoder for Gemini-style stream frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiDecoder;

impl FrameDecoder for GeminiDecoder {
    fn decode_frame(&self, frame: &str) -> Vec<StreamEvent> {
        let data = frame.strip_prefix("data:").unwrap_or(frame).trim();
        // The non-SSE endpoint streams a JSON array; its punctuation lines
        // are framing noise, not payloads.
        if data.is_empty() || matches!(data, "[" | "]" | ",") {
            return Vec::new();
        }
        // Array chunkings put the separator in front of the object.
        let data = data.strip_prefix(',').unwrap_or(data).trim_start();

        let chunk: GeminiStreamChunk = match serde_json::from_str(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed Gemini frame");
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        let candidate = chunk.candidates.as_ref().and_then(|c| c.first());

        if let Some(parts) = candidate
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_ref())
        {
            for part in parts {
                if let Some(text) = part.text.as_ref().filter(|t| !t.is_empty()) {
                    if part.thought.unwrap_or(false) {
                        events.push(StreamEvent::Thinking { step: text.clone() });
                    } else {
                        events.push(StreamEvent::Token { content: text.clone() });
                    }
                }
                if let Some(call) = &part.function_call {
                    events.push(StreamEvent::ToolCall { tool_call: convert_function_call(call) });
                }
            }
        }

        if let Some(finish_reason) = candidate.and_then(|c| c.finish_reason.as_deref()) {
            tracing::debug!(finish_reason, "Gemini candidate finished");
            events.push(StreamEvent::Done {
                usage: chunk.usage_metadata.map(GeminiUsageMetadata::into_token_usage),
            });
        }

        events
    }
}

/// Gemini assigns no call ids; the function name stands in so consumers
/// still see each call open distinctly.
fn convert_function_call(call: &GeminiFunctionCall) -> ToolCall {
    let arguments = call
        .args
        .as_ref()
        .map(|args| args.to_string())
        .unwrap_or_else(|| "{}".to_string());
    ToolCall::function(call.name.clone(), call.name.clone(), arguments)
}
