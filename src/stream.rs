//! Normalized streaming events and stream helpers.
//!
//! Every provider decoder maps its wire frames into [`StreamEvent`], so
//! consumers handle one union regardless of vendor. A well-formed stream is
//! zero or more content events followed by exactly one terminal event:
//! `Done` on success, `Error` on failure, never both.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::types::{Citation, TokenUsage, ToolCall};

/// One normalized event from a model stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text; apply by concatenation, in arrival order.
    Token {
        /// The incremental text content
        content: String,
    },
    /// A complete or partial tool-call fragment. Fragments are emitted as
    /// they arrive and never reassembled by the decoder.
    ToolCall {
        /// The fragment; fields the frame did not carry are empty
        tool_call: ToolCall,
    },
    /// Incremental reasoning text (not emitted by all providers).
    Thinking {
        /// The incremental thinking content
        step: String,
    },
    /// A source citation (not emitted by all providers).
    Citation {
        /// The citation payload
        citation: Citation,
    },
    /// Terminal success event; at most one per stream.
    Done {
        /// Final token accounting, when the provider reported it
        usage: Option<TokenUsage>,
    },
    /// Terminal failure event; mutually exclusive with `Done`.
    Error {
        /// Human-readable failure description
        message: String,
    },
}

impl StreamEvent {
    /// Returns `true` for the two terminal variants.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// A pull-based, single-consumer stream of normalized events.
///
/// Lazy: the underlying HTTP request is issued on first poll. Dropping the
/// stream drops the response and releases the connection; there is no
/// separate cancellation handle.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

static_assertions::assert_impl_all!(StreamEvent: Send, Sync);
static_assertions::assert_impl_all!(EventStream: Send, Unpin);

/// Folds a consumed event sequence back into whole values.
///
/// Decoders emit tool calls fragment by fragment; reassembly is the
/// consumer's job and this is the standard way to do it. Fragments that
/// carry an id open a new call; id-less fragments append their argument
/// delta to the most recently opened call.
#[derive(Debug, Default)]
pub struct StreamCollector {
    text: String,
    thinking: Vec<String>,
    tool_calls: Vec<ToolCall>,
    citations: Vec<Citation>,
    usage: Option<TokenUsage>,
    error: Option<String>,
    finished: bool,
}

impl StreamCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs one event. Events after a terminal are a protocol violation
    /// and are ignored.
    pub fn push(&mut self, event: &StreamEvent) {
        if self.finished {
            return;
        }
        match event {
            StreamEvent::Token { content } => self.text.push_str(content),
            StreamEvent::Thinking { step } => self.thinking.push(step.clone()),
            StreamEvent::Citation { citation } => self.citations.push(citation.clone()),
            StreamEvent::ToolCall { tool_call } => self.merge_tool_call(tool_call),
            StreamEvent::Done { usage } => {
                self.usage = usage.clone();
                self.finished = true;
            }
            StreamEvent::Error { message } => {
                self.error = Some(message.clone());
                self.finished = true;
            }
        }
    }

    fn merge_tool_call(&mut self, fragment: &ToolCall) {
        if !fragment.id.is_empty() {
            self.tool_calls.push(fragment.clone());
            return;
        }
        let delta = fragment
            .function
            .as_ref()
            .map(|f| f.arguments.as_str())
            .unwrap_or_default();
        match self.tool_calls.last_mut().and_then(|c| c.function.as_mut()) {
            Some(function) => function.arguments.push_str(delta),
            // Continuation with no opener: keep it rather than drop data.
            None => self.tool_calls.push(fragment.clone()),
        }
    }

    /// Drives `stream` to completion and returns the filled collector.
    pub async fn collect<S>(stream: S) -> Self
    where
        S: Stream<Item = StreamEvent>,
    {
        use futures_util::StreamExt;
        let mut collector = Self::new();
        let mut stream = std::pin::pin!(stream);
        while let Some(event) = stream.next().await {
            collector.push(&event);
            if collector.finished {
                break;
            }
        }
        collector
    }

    /// Accumulated text so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Accumulated thinking steps so far.
    pub fn thinking(&self) -> &[String] {
        &self.thinking
    }

    /// Reassembled tool calls so far.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    /// Final usage, once a `Done` event carried one.
    pub fn usage(&self) -> Option<&TokenUsage> {
        self.usage.as_ref()
    }

    /// Terminal error message, if the stream failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a terminal event has been absorbed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Converts the collected state into an assistant message.
    pub fn into_message(self) -> crate::types::Message {
        let mut message = crate::types::Message::assistant(self.text);
        if !self.tool_calls.is_empty() {
            message.tool_calls = Some(self.tool_calls);
        }
        if !self.citations.is_empty() {
            message.citations = Some(self.citations);
        }
        message
    }
}
