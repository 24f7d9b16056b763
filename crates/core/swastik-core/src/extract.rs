//! Lenient reply extraction from upstream JSON bodies
//!
//! Upstream agent services do not agree on where the generated text lives.
//! Adapters declare an ordered list of JSON pointers; the first one that
//! resolves to a non-blank string wins.

use crate::error::BackendError;
use serde_json::Value;

/// Return the first non-blank string found at `pointers`, in order
pub fn extract_reply(body: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| body.pointer(p))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Parse a raw response body and extract the reply
///
/// A body that is not JSON is an upstream error; JSON without reply content
/// is an empty response.
pub fn parse_reply(raw: &str, pointers: &[&str]) -> Result<String, BackendError> {
    let body: Value = serde_json::from_str(raw)
        .map_err(|e| BackendError::upstream(None, format!("malformed response body: {e}")))?;
    extract_reply(&body, pointers).ok_or(BackendError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PATHS: &[&str] = &["/choices/0/message/content", "/output/text", "/result"];

    #[test]
    fn test_priority_order() {
        let body = json!({
            "result": "plain",
            "choices": [{"message": {"content": "structured"}}],
        });
        assert_eq!(extract_reply(&body, PATHS).as_deref(), Some("structured"));
    }

    #[test]
    fn test_blank_and_non_string_values_are_skipped() {
        let body = json!({
            "choices": [{"message": {"content": "   "}}],
            "output": {"text": 42},
            "result": "fallback text",
        });
        assert_eq!(extract_reply(&body, PATHS).as_deref(), Some("fallback text"));
    }

    #[test]
    fn test_parse_reply_errors() {
        assert_eq!(parse_reply("{}", PATHS), Err(BackendError::EmptyResponse));
        assert!(matches!(
            parse_reply("<html>oops</html>", PATHS),
            Err(BackendError::Upstream { status: None, .. })
        ));
        assert_eq!(
            parse_reply(r#"{"output":{"text":"hi"}}"#, PATHS).unwrap(),
            "hi"
        );
    }
}
