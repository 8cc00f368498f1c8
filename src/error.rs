//! Unified error type for all adapter operations.

use thiserror::Error;

/// Errors surfaced by provider adapters.
///
/// One-shot calls return these through `Result`; streaming calls re-express
/// failures as a single terminal [`StreamEvent`](crate::stream::StreamEvent)
/// `Error` item so the event union stays the only streaming contract.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// HTTP-level failure before or while reading a response.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-success status from a provider API.
    ///
    /// `message` carries the provider-reported detail when the error body
    /// parses, otherwise the HTTP status text.
    #[error("API error {code}: {message}")]
    ApiError {
        /// HTTP status code.
        code: u16,
        /// Human-readable error description.
        message: String,
        /// Raw provider error object, when one was returned.
        details: Option<serde_json::Value>,
    },

    /// The provider rejected the credential.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider throttled the request.
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// A response body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A failure while reading an open stream.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// The streaming response produced no body bytes at all.
    ///
    /// Distinct from [`AdapterError::ApiError`]: the status was a success
    /// but there was nothing to frame.
    #[error("Response body is missing or empty")]
    MissingResponseBody,

    /// Invalid or unknown adapter configuration, e.g. an unregistered
    /// provider id.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AdapterError {
    /// Returns `true` for errors caused by a rejected or missing credential.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationError(_) | Self::ApiError { code: 401 | 403, .. }
        )
    }

    /// The HTTP status code, when the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_code_and_message() {
        let err = AdapterError::ApiError {
            code: 429,
            message: "rate limited".to_string(),
            details: None,
        };
        let display = format!("{err}");
        assert!(display.contains("429"));
        assert!(display.contains("rate limited"));
    }

    #[test]
    fn test_auth_detection_covers_status_codes() {
        let err = AdapterError::ApiError {
            code: 401,
            message: "invalid x-api-key".to_string(),
            details: None,
        };
        assert!(err.is_auth_error());
        assert!(!AdapterError::MissingResponseBody.is_auth_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: AdapterError = json_err.into();
        assert!(matches!(err, AdapterError::ParseError(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AdapterError>();
    }
}
