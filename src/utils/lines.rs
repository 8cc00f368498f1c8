//! Line framing for streaming response bodies.
//!
//! Providers deliver newline-delimited wire frames (`data:`-prefixed SSE
//! lines or raw JSON lines). [`LineFramer`] turns arbitrary byte chunks into
//! complete lines: it carries an incomplete trailing line across chunks,
//! tolerates UTF-8 sequences split at chunk boundaries, and trims a trailing
//! `\r`. A dangling partial line at end of stream is discarded, never
//! emitted as a synthetic frame.

use futures::Stream;
use futures_util::StreamExt;

use crate::error::AdapterError;

/// Incremental byte-to-line splitter.
#[derive(Debug, Default)]
pub(crate) struct LineFramer {
    /// Decoded text waiting for a line terminator.
    buffer: String,
    /// Undecoded bytes: at most one incomplete UTF-8 sequence.
    utf8_buf: Vec<u8>,
}

impl LineFramer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns every line it completed, in order.
    /// Empty lines are real frames and are returned as empty strings.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.utf8_buf.extend_from_slice(chunk);
        self.decode_available();

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);
            lines.push(line);
        }
        lines
    }

    fn decode_available(&mut self) {
        loop {
            match std::str::from_utf8(&self.utf8_buf) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.utf8_buf.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    if valid_up_to > 0
                        && let Ok(valid) = std::str::from_utf8(&self.utf8_buf[..valid_up_to])
                    {
                        self.buffer.push_str(valid);
                    }
                    match e.error_len() {
                        // Invalid bytes: skip them and keep decoding.
                        Some(len) => {
                            self.utf8_buf.drain(..valid_up_to + len);
                        }
                        // Incomplete trailing sequence: keep it for the
                        // next chunk.
                        None => {
                            self.utf8_buf.drain(..valid_up_to);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Consumes the framer, returning the dangling partial line if the
    /// stream ended without terminating it. The caller drops it.
    pub(crate) fn finish(self) -> Option<String> {
        if self.buffer.is_empty() && self.utf8_buf.is_empty() {
            None
        } else {
            Some(self.buffer)
        }
    }
}

/// Adapts a byte-chunk stream into a lazy stream of line frames.
///
/// Read failures surface as a single `Err` item and end the stream.
pub(crate) fn frame_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, AdapterError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    async_stream::stream! {
        let mut framer = LineFramer::new();
        let mut bytes = std::pin::pin!(bytes);
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for line in framer.push(chunk.as_ref()) {
                        yield Ok(line);
                    }
                }
                Err(e) => {
                    yield Err(AdapterError::StreamError(format!("stream read error: {e}")));
                    return;
                }
            }
        }
        if let Some(partial) = framer.finish() {
            tracing::debug!(
                len = partial.len(),
                "discarding partial line at end of stream"
            );
        }
    }
}
