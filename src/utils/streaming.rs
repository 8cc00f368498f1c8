//! Shared stream assembly for all provider adapters.
//!
//! One pipeline serves every vendor: send the request on first poll, frame
//! the body into lines, decode each frame, and enforce the event contract
//! (zero or more content events, then exactly one terminal). Vendor
//! differences live entirely in the request and the [`FrameDecoder`].

use futures_util::StreamExt;

use crate::error::AdapterError;
use crate::stream::{EventStream, StreamEvent};
use crate::traits::FrameDecoder;
use crate::types::{StreamCallbacks, TokenUsage};
use crate::utils::lines::frame_lines;

pub(crate) struct StreamFactory;

impl StreamFactory {
    /// Builds the event stream for one streaming call.
    ///
    /// Lazy: `request` is sent when the returned stream is first polled.
    /// Transport failures (send error, non-success status, empty body)
    /// become a single terminal `Error` event. After any terminal event
    /// the stream is fused and the connection is released. A wire that
    /// ends without a decoder-level terminal gets a fallback:
    /// `Done { usage: None }` when frames were seen, the missing-body
    /// error when none were.
    pub(crate) fn create_event_stream<D, C, E>(
        request: reqwest::RequestBuilder,
        decoder: D,
        attach_cost: C,
        parse_error: E,
        callbacks: StreamCallbacks,
    ) -> EventStream
    where
        D: FrameDecoder + 'static,
        C: Fn(&TokenUsage) -> f64 + Send + 'static,
        E: Fn(u16, &str) -> AdapterError + Send + 'static,
    {
        Box::pin(async_stream::stream! {
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    yield StreamEvent::Error {
                        message: AdapterError::from(e).to_string(),
                    };
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                yield StreamEvent::Error {
                    message: parse_error(status.as_u16(), &body).to_string(),
                };
                return;
            }

            let mut frames = std::pin::pin!(frame_lines(response.bytes_stream()));
            let mut saw_frame = false;
            let mut terminated = false;

            'wire: while let Some(frame) = frames.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(e) => {
                        yield StreamEvent::Error { message: e.to_string() };
                        terminated = true;
                        break;
                    }
                };
                saw_frame = true;
                tracing::trace!(frame = %frame, "wire frame");

                for event in decoder.decode_frame(&frame) {
                    let event = match event {
                        StreamEvent::Done { usage } => StreamEvent::Done {
                            usage: usage.map(|mut usage| {
                                usage.estimated_cost = Some(attach_cost(&usage));
                                usage
                            }),
                        },
                        other => other,
                    };
                    match &event {
                        StreamEvent::Token { content } => callbacks.notify_token(content),
                        StreamEvent::ToolCall { tool_call } => {
                            callbacks.notify_tool_call(tool_call)
                        }
                        _ => {}
                    }
                    let is_terminal = event.is_terminal();
                    yield event;
                    if is_terminal {
                        terminated = true;
                        break 'wire;
                    }
                }
            }

            if !terminated {
                if saw_frame {
                    // Wire closed cleanly but no frame carried the
                    // terminal; the contract still owes the caller one.
                    yield StreamEvent::Done { usage: None };
                } else {
                    yield StreamEvent::Error {
                        message: AdapterError::MissingResponseBody.to_string(),
                    };
                }
            }
        })
    }
}
