use serde_json::Value;
use thiserror::Error;

/// Errors shared by every provider client built on this crate
#[derive(Error, Debug)]
pub enum CommonRequestError {
    /// HTTP request failed before a status was available (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Structured error body, when the server sent JSON
        body: Option<Value>,
    },
}

/// Parse error response from HTTP status and body
pub fn parse_error_response(status: reqwest::StatusCode, body: &bytes::Bytes) -> CommonRequestError {
    let json = serde_json::from_slice::<Value>(body).ok();

    let message = json
        .as_ref()
        .and_then(extract_error_message)
        .unwrap_or_else(|| snippet(&String::from_utf8_lossy(body), 500));

    CommonRequestError::Api {
        status: status.as_u16(),
        message,
        body: json,
    }
}

/// Extract error message from the JSON error formats seen on OpenAI-compatible endpoints
fn extract_error_message(json: &Value) -> Option<String> {
    // {"error": {"message": "...", "code": "..."}}
    if let Some(message) = json
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    // DashScope native: {"code": "...", "message": "...", "request_id": "..."}
    json.get("message")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

/// Truncate `text` to at most `max_chars` characters for log output.
///
/// Truncated text ends with `...`.
#[must_use]
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_parse_openai_style_error() {
        let body = bytes::Bytes::from_static(
            br#"{"error":{"message":"Incorrect API key provided.","type":"invalid_request_error","code":"invalid_api_key"}}"#,
        );
        let err = parse_error_response(StatusCode::UNAUTHORIZED, &body);

        match err {
            CommonRequestError::Api {
                status,
                message,
                body,
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided.");
                assert_eq!(
                    body.as_ref().and_then(|b| b["error"]["code"].as_str()),
                    Some("invalid_api_key")
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_native_error() {
        let body = bytes::Bytes::from_static(
            br#"{"code":"Throttling","message":"Requests rate limit exceeded","request_id":"abc"}"#,
        );
        let err = parse_error_response(StatusCode::TOO_MANY_REQUESTS, &body);
        assert_eq!(err.to_string(), "HTTP 429: Requests rate limit exceeded");
    }

    #[test]
    fn test_parse_plain_text_error() {
        let body = bytes::Bytes::from_static(b"upstream connect error");
        let err = parse_error_response(StatusCode::BAD_GATEWAY, &body);

        match err {
            CommonRequestError::Api { message, body, .. } => {
                assert_eq!(message, "upstream connect error");
                assert!(body.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        assert_eq!(snippet("短文本", 50), "短文本");
        assert_eq!(snippet("霸王茶姬买一送一", 4), "霸王茶姬...");
        assert_eq!(snippet("", 3), "");
    }
}
