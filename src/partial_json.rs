//! Tolerant parsing for incomplete JSON in accumulating stream text.
//!
//! While a model is still streaming, the text so far is usually not valid
//! JSON. [`parse_partial_json`] recovers the longest parsable object prefix
//! so a consumer can render structured content before the stream completes.
//! It is meant to be re-run over the full accumulated text on every update;
//! payloads are small, so the quadratic worst case is acceptable.

use serde_json::Value;

/// Result of a tolerant parse: the recovered value, if any, and the
/// unconsumed tail.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialJson {
    /// The parsed value, when the text or one of its prefixes parsed.
    pub value: Option<Value>,
    /// Everything after the parsed prefix; the full input when nothing
    /// parsed.
    pub remainder: String,
}

/// Parses `text` as JSON, falling back to the longest parsable prefix.
///
/// The full text is tried first. On failure, close-brace positions are
/// scanned backward from the end and each prefix ending at one is tried;
/// the first success (the longest prefix) wins and the rest becomes the
/// remainder. Plain prose and open fragments return no value with the
/// whole input as remainder. Never panics, never errors.
///
/// # Examples
///
/// ```rust
/// use unichat::partial_json::parse_partial_json;
///
/// let result = parse_partial_json(r#"{"a":1} and counting"#);
/// assert_eq!(result.value.unwrap()["a"], 1);
/// assert_eq!(result.remainder, " and counting");
///
/// let open = parse_partial_json(r#"{"a":1,"b":"#);
/// assert!(open.value.is_none());
/// assert_eq!(open.remainder, r#"{"a":1,"b":"#);
/// ```
pub fn parse_partial_json(text: &str) -> PartialJson {
    if text.is_empty() {
        return PartialJson { value: None, remainder: String::new() };
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return PartialJson { value: Some(value), remainder: String::new() };
    }

    // '}' is ASCII, so every hit is a char boundary.
    let bytes = text.as_bytes();
    for pos in (0..bytes.len()).rev() {
        if bytes[pos] != b'}' {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&text[..=pos]) {
            return PartialJson {
                value: Some(value),
                remainder: text[pos + 1..].to_string(),
            };
        }
    }

    PartialJson { value: None, remainder: text.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_object_has_empty_remainder() {
        let result = parse_partial_json(r#"{"a":1,"b":2}"#);
        assert_eq!(result.value, Some(json!({"a": 1, "b": 2})));
        assert_eq!(result.remainder, "");
    }

    #[test]
    fn test_open_fragment_returns_no_value() {
        let input = r#"{"a":1,"b":"#;
        let result = parse_partial_json(input);
        assert!(result.value.is_none());
        assert_eq!(result.remainder, input);
    }

    #[test]
    fn test_object_with_trailing_prose() {
        let result = parse_partial_json(r#"{"done":true} extra words"#);
        assert_eq!(result.value, Some(json!({"done": true})));
        assert_eq!(result.remainder, " extra words");
    }

    #[test]
    fn test_longest_prefix_wins() {
        // The scan runs backward from the end, so the outer close brace is
        // tried before the inner one and the whole nested object wins.
        let result = parse_partial_json(r#"{"a":{"b":1}}{"c":"#);
        assert_eq!(result.value, Some(json!({"a": {"b": 1}})));
        assert_eq!(result.remainder, r#"{"c":"#);
    }

    #[test]
    fn test_plain_prose_is_not_an_error() {
        let result = parse_partial_json("just some words");
        assert!(result.value.is_none());
        assert_eq!(result.remainder, "just some words");
    }

    #[test]
    fn test_empty_input_skips_parsing() {
        let result = parse_partial_json("");
        assert!(result.value.is_none());
        assert_eq!(result.remainder, "");
    }

    #[test]
    fn test_partial_array_is_not_recovered() {
        // Recovery scans close braces only; arrays parse when complete or
        // not at all.
        let complete = parse_partial_json("[1,2,3]");
        assert_eq!(complete.value, Some(json!([1, 2, 3])));

        let partial = parse_partial_json("[1,2,");
        assert!(partial.value.is_none());
        assert_eq!(partial.remainder, "[1,2,");
    }

    #[test]
    fn test_multibyte_text_never_panics() {
        let result = parse_partial_json("héllo wörld {\"kéy\": \"vàl\"} tail");
        assert_eq!(result.value, Some(json!({"kéy": "vàl"})));
        assert_eq!(result.remainder, " tail");
    }

    #[test]
    fn test_brace_inside_string_is_tried_and_rejected() {
        // The '}' inside the string literal is a scan position, but the
        // prefix ending there does not parse; the full object still wins.
        let result = parse_partial_json(r#"{"text":"a } b"} rest"#);
        assert_eq!(result.value, Some(json!({"text": "a } b"})));
        assert_eq!(result.remainder, " rest");
    }
}
