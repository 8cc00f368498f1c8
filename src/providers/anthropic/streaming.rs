//! Anthropic stream frame decoding.
//!
//! Frames are `data:`-prefixed SSE lines whose JSON carries a `type`
//! discriminator. The usage-bearing `message_delta` frame is the terminal;
//! `message_stop` arrives after it and carries nothing new, so it is
//! ignored, as are `ping` and the `event:` name lines.

use serde::Deserialize;

use crate::stream::StreamEvent;
use crate::traits::FrameDecoder;
use crate::types::{Citation, TokenUsage, ToolCall};

/// Anthropic stream event structure, flexible across the event types the
/// SSE stream interleaves.
#[derive(Debug, Clone, Deserialize)]
struct AnthropicStreamEvent {
    r#type: String,
    #[serde(default)]
    delta: Option<AnthropicDelta>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    content_block: Option<AnthropicContentBlock>,
    #[serde(default)]
    error: Option<AnthropicErrorBody>,
    #[serde(default)]
    #[allow(dead_code)]
    // Block index accompanies content events; ordering is already frame order
    index: Option<usize>,
}

/// Anthropic delta structure, covering text_delta, input_json_delta,
/// thinking_delta and citations_delta payloads.
#[derive(Debug, Clone, Deserialize)]
struct AnthropicDelta {
    #[serde(rename = "type")]
    #[serde(default)]
    #[allow(dead_code)]
    // Subtype is implied by which payload field is set
    delta_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    partial_json: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    citation: Option<AnthropicCitation>,
    #[serde(default)]
    #[allow(dead_code)]
    // Carried on the terminal message_delta; the usage field is the signal
    stop_reason: Option<String>,
}

/// Opening descriptor of a content block.
#[derive(Debug, Clone, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Anthropic usage structure
#[derive(Debug, Clone, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

/// Citation payload from a citations_delta event.
#[derive(Debug, Clone, Deserialize)]
struct AnthropicCitation {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    document_title: Option<String>,
    #[serde(default)]
    cited_text: Option<String>,
    #[serde(default)]
    start_char_index: Option<u32>,
    #[serde(default)]
    end_char_index: Option<u32>,
}

/// In-stream error payload.
#[derive(Debug, Clone, Deserialize)]
struct AnthropicErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Stateless decoder for Anthropic-style stream frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicDecoder;

impl FrameDecoder for AnthropicDecoder {
    fn decode_frame(&self, frame: &str) -> Vec<StreamEvent> {
        // `event:` name lines and blank separators carry no payload.
        let Some(data) = frame.strip_prefix("data:") else {
            return Vec::new();
        };
        let data = data.trim();
        if data.is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<AnthropicStreamEvent>(data) {
            Ok(event) => convert_event(event),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed Anthropic frame");
                Vec::new()
            }
        }
    }
}

fn convert_event(event: AnthropicStreamEvent) -> Vec<StreamEvent> {
    match event.r#type.as_str() {
        "content_block_start" => {
            // Only tool_use blocks open with information the consumer
            // needs ahead of the deltas.
            let Some(block) = event.content_block else {
                return Vec::new();
            };
            if block.block_type != "tool_use" {
                return Vec::new();
            }
            vec![StreamEvent::ToolCall {
                tool_call: ToolCall::function(
                    block.id.unwrap_or_default(),
                    block.name.unwrap_or_default(),
                    "",
                ),
            }]
        }
        "content_block_delta" => {
            let Some(delta) = event.delta else {
                return Vec::new();
            };
            let mut events = Vec::new();
            if let Some(text) = delta.text.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::Token { content: text });
            }
            if let Some(partial_json) = delta.partial_json {
                // Continuation fragment: empty id and name by contract.
                events.push(StreamEvent::ToolCall {
                    tool_call: ToolCall::function("", "", partial_json),
                });
            }
            if let Some(thinking) = delta.thinking.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::Thinking { step: thinking });
            }
            if let Some(citation) = delta.citation {
                events.push(StreamEvent::Citation { citation: convert_citation(citation) });
            }
            events
        }
        // The usage-bearing frame type is distinct from the content
        // deltas; it is the stream's terminal.
        "message_delta" => match event.usage {
            Some(usage) => {
                let prompt = usage.input_tokens.unwrap_or(0);
                let completion = usage.output_tokens.unwrap_or(0);
                vec![StreamEvent::Done {
                    usage: Some(TokenUsage {
                        prompt_tokens: prompt,
                        completion_tokens: completion,
                        total_tokens: prompt + completion,
                        estimated_cost: None,
                    }),
                }]
            }
            None => Vec::new(),
        },
        "error" => {
            let message = event
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown Anthropic stream error".to_string());
            vec![StreamEvent::Error { message }]
        }
        // message_start, message_stop, content_block_stop, ping
        _ => Vec::new(),
    }
}

fn convert_citation(citation: AnthropicCitation) -> Citation {
    Citation {
        source: citation.url,
        title: citation.title.or(citation.document_title),
        cited_text: citation.cited_text,
        start_index: citation.start_char_index,
        end_index: citation.end_char_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(frame: &str) -> Vec<StreamEvent> {
        AnthropicDecoder.decode_frame(frame)
    }

    #[test]
    fn test_text_delta_becomes_token() {
        let events = decode(
            r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
        );
        assert_eq!(events, vec![StreamEvent::Token { content: "Hello".to_string() }]);
    }

    #[test]
    fn test_event_name_lines_are_ignored() {
        assert!(decode("event: content_block_delta").is_empty());
        assert!(decode("").is_empty());
    }

    #[test]
    fn test_tool_use_block_start_opens_call() {
        let events = decode(
            r#"data: {"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"get_weather","input":{}}}"#,
        );
        assert_eq!(events.len(), 1);
        let StreamEvent::ToolCall { tool_call } = &events[0] else {
            panic!("expected tool call event");
        };
        assert_eq!(tool_call.id, "toolu_01");
        assert_eq!(tool_call.function.as_ref().unwrap().name, "get_weather");
        assert!(tool_call.function.as_ref().unwrap().arguments.is_empty());
    }

    #[test]
    fn test_text_block_start_is_silent() {
        let events = decode(
            r#"data: {"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_input_json_delta_is_argument_fragment() {
        let events = decode(
            r#"data: {"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"city\":"}}"#,
        );
        assert_eq!(events.len(), 1);
        let StreamEvent::ToolCall { tool_call } = &events[0] else {
            panic!("expected tool call event");
        };
        assert!(tool_call.id.is_empty());
        assert_eq!(tool_call.function.as_ref().unwrap().arguments, r#"{"city":"#);
    }

    #[test]
    fn test_thinking_delta() {
        let events = decode(
            r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"step one"}}"#,
        );
        assert_eq!(events, vec![StreamEvent::Thinking { step: "step one".to_string() }]);
    }

    #[test]
    fn test_citations_delta() {
        let events = decode(
            r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"citations_delta","citation":{"type":"char_location","cited_text":"the sky is blue","document_title":"Weather FAQ","start_char_index":10,"end_char_index":25}}}"#,
        );
        assert_eq!(events.len(), 1);
        let StreamEvent::Citation { citation } = &events[0] else {
            panic!("expected citation event");
        };
        assert_eq!(citation.cited_text.as_deref(), Some("the sky is blue"));
        assert_eq!(citation.title.as_deref(), Some("Weather FAQ"));
        assert_eq!(citation.start_index, Some(10));
    }

    #[test]
    fn test_message_delta_with_usage_is_terminal() {
        let events = decode(
            r#"data: {"type":"message_delta","delta":{"stop_reason":"end_turn","stop_sequence":null},"usage":{"input_tokens":25,"output_tokens":50}}"#,
        );
        assert_eq!(events.len(), 1);
        let StreamEvent::Done { usage: Some(usage) } = &events[0] else {
            panic!("expected done with usage");
        };
        assert_eq!(usage.prompt_tokens, 25);
        assert_eq!(usage.completion_tokens, 50);
        assert_eq!(usage.total_tokens, 75);
    }

    #[test]
    fn test_message_stop_and_ping_are_ignored() {
        assert!(decode(r#"data: {"type":"message_stop"}"#).is_empty());
        assert!(decode(r#"data: {"type":"ping"}"#).is_empty());
        assert!(
            decode(r#"data: {"type":"message_start","message":{"id":"msg_01","role":"assistant"}}"#)
                .is_empty()
        );
    }

    #[test]
    fn test_error_event_is_terminal_error() {
        let events = decode(
            r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert_eq!(events, vec![StreamEvent::Error { message: "Overloaded".to_string() }]);
    }

    #[test]
    fn test_malformed_json_is_swallowed() {
        assert!(decode("data: {broken").is_empty());
    }
}
