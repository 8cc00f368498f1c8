//! Provider adapter implementations.
//!
//! One module per vendor. Each contains the adapter facade (`client`),
//! the wire decoder (`streaming`) and the static model catalog with its
//! rate table (`models`).

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::error::AdapterError;

/// Maps a non-success HTTP response onto an [`AdapterError`].
///
/// All three vendors wrap failures as `{"error": {"message": ...}}`, so a
/// single extraction covers them; anything unparseable falls back to the
/// raw body text.
pub(crate) fn parse_error_body(provider: &str, status: u16, body: &str) -> AdapterError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| format!("{provider} API error: {m}"))
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("{provider} API error: HTTP {status}")
            } else {
                format!("{provider} API error: {body}")
            }
        });

    match status {
        401 | 403 => AdapterError::AuthenticationError(message),
        429 => AdapterError::RateLimitError(message),
        _ => AdapterError::ApiError {
            code: status,
            message,
            details: serde_json::from_str(body).ok(),
        },
    }
}
