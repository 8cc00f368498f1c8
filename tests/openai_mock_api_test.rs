//! Mock API tests for the OpenAI adapter.
//!
//! Wire fixtures follow the official Chat Completions reference:
//! https://platform.openai.com/docs/api-reference/chat

use futures_util::StreamExt;
use serde_json::json;
use unichat::{AdapterError, Message, ModelConfig, OpenAiAdapter, ProviderAdapter, StreamEvent};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ModelConfig {
    ModelConfig::new("openai", "gpt-4o")
        .with_api_key("test-api-key")
        .with_base_url(server.uri())
}

fn chat_completion_response() -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "Hello! How can I help you today?"
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 9,
            "completion_tokens": 12,
            "total_tokens": 21
        }
    })
}

#[tokio::test]
async fn test_chat_returns_assistant_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_response()))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let message = adapter
        .chat(vec![Message::user("Hello")], &config_for(&server))
        .await
        .unwrap();

    assert_eq!(message.text(), "Hello! How can I help you today?");
    assert!(message.tool_calls.is_none());
}

#[tokio::test]
async fn test_chat_tool_calls_response() {
    let server = MockServer::start().await;

    let response = json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc123",
                    "type": "function",
                    "function": {
                        "name": "get_weather",
                        "arguments": "{\"location\":\"San Francisco\"}"
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let message = adapter
        .chat(
            vec![Message::user("What's the weather?")],
            &config_for(&server),
        )
        .await
        .unwrap();

    let tool_calls = message.tool_calls.unwrap();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].id, "call_abc123");
    assert_eq!(tool_calls[0].function.as_ref().unwrap().name, "get_weather");
}

#[tokio::test]
async fn test_chat_auth_error_is_typed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let err = adapter
        .chat(vec![Message::user("Hello")], &config_for(&server))
        .await
        .unwrap_err();

    assert!(err.is_auth_error());
    assert!(err.to_string().contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_chat_no_choices_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": []
        })))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let err = adapter
        .chat(vec![Message::user("Hello")], &config_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::ApiError { code: 500, .. }));
}

fn sse_body(frames: &[&str]) -> String {
    let mut body = String::new();
    for frame in frames {
        body.push_str(frame);
        body.push_str("\n\n");
    }
    body
}

#[tokio::test]
async fn test_stream_tokens_then_done_with_cost() {
    let server = MockServer::start().await;

    let body = sse_body(&[
        r#"data: {"choices":[{"delta":{"role":"assistant","content":""}}]}"#,
        r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
        r#"data: {"choices":[{"delta":{"content":" there"}}]}"#,
        r#"data: {"choices":[{"delta":{}}],"usage":{"prompt_tokens":1000,"completion_tokens":1000,"total_tokens":2000}}"#,
        "data: [DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let mut stream = adapter.stream(vec![Message::user("Hello")], &config_for(&server));

    let mut text = String::new();
    let mut done_usage = None;
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Token { content } => text.push_str(&content),
            StreamEvent::Done { usage } => done_usage = usage,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    assert_eq!(text, "Hi there");
    let usage = done_usage.unwrap();
    assert_eq!(usage.prompt_tokens, 1000);
    assert_eq!(usage.completion_tokens, 1000);
    assert_eq!(usage.total_tokens, 2000);
    // gpt-4o at $0.0025/1K in and $0.01/1K out.
    let cost = usage.estimated_cost.unwrap();
    assert!((cost - 0.0125).abs() < 1e-9);
}

#[tokio::test]
async fn test_stream_is_fused_after_terminal() {
    let server = MockServer::start().await;

    let body = sse_body(&[
        r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
        r#"data: {"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
        r#"data: {"choices":[{"delta":{"content":"never seen"}}]}"#,
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let mut stream = adapter.stream(vec![Message::user("Hello")], &config_for(&server));

    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], StreamEvent::Token { .. }));
    assert!(matches!(events[1], StreamEvent::Done { .. }));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_stream_swallows_malformed_frame() {
    let server = MockServer::start().await;

    let body = sse_body(&[
        r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#,
        r#"data: {"choices":[{"delta":{"content":"#,
        r#"data: {"choices":[{"delta":{"content":" there"}}]}"#,
        r#"data: {"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}}"#,
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let events: Vec<StreamEvent> = adapter
        .stream(vec![Message::user("Hello")], &config_for(&server))
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        StreamEvent::Token {
            content: "Hi".to_string()
        }
    );
    assert_eq!(
        events[1],
        StreamEvent::Token {
            content: " there".to_string()
        }
    );
    assert!(matches!(events[2], StreamEvent::Done { .. }));
}

#[tokio::test]
async fn test_stream_http_error_becomes_error_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "message": "Rate limit reached", "type": "tokens" }
        })))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new();
    let events: Vec<StreamEvent> = adapter
        .stream(vec![Message::user("Hello")], &config_for(&server))
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    let StreamEvent::Error { message } = &events[0] else {
        panic!("expected error event, got {:?}", events[0]);
    };
    assert!(message.contains("Rate limit reached"));
}
