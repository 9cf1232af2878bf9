use serde::{Deserialize, Serialize};

/// Non-streamed `chat/completions` body. Fields the client does not read are
/// optional so that provider additions never break decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: ResponseMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ResponseContent>,
}

/// Assistant content as returned by the server: a string, or typed parts
/// (vision models may answer `[{"type": "text", "text": "..."}]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseContent {
    Text(String),
    Parts(Vec<ResponsePart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ResponseContent {
    /// Flatten to plain text. Only `text`-typed parts contribute.
    pub fn to_text(&self) -> String {
        match self {
            ResponseContent::Text(text) => text.clone(),
            ResponseContent::Parts(parts) => parts
                .iter()
                .filter(|part| part.kind.as_deref() == Some("text"))
                .filter_map(|part| part.text.as_deref())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice.
    ///
    /// `None` when there are no choices at all; `Some("")` when the first
    /// choice carries no content.
    pub fn text(&self) -> Option<String> {
        self.choices.first().map(|choice| {
            choice
                .message
                .content
                .as_ref()
                .map(ResponseContent::to_text)
                .unwrap_or_default()
        })
    }
}

/// One decoded server-sent event of a streamed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Incremental text of the first choice, if it carries any
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_from_string_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"id":"chatcmpl-1","model":"qwen3-235b-a22b","choices":[{"index":0,"message":{"role":"assistant","content":"类别4"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":2,"total_tokens":12}}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("类别4"));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(12));
    }

    #[test]
    fn test_text_from_parts_keeps_only_text_parts() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":[{"type":"text","text":"一杯"},{"type":"image_url","image_url":{"url":"x"}},{"text":"untyped"},{"type":"text","text":"奶茶"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("一杯奶茶"));
    }

    #[test]
    fn test_text_shapes() {
        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(empty.text(), None);

        let missing: ChatResponse = serde_json::from_str(r#"{"output":{}}"#).unwrap();
        assert_eq!(missing.text(), None);

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(null_content.text().as_deref(), Some(""));
    }

    #[test]
    fn test_chunk_delta_text() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap();
        assert_eq!(chunk.delta_text(), Some("Hel"));

        let role_only: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#)
                .unwrap();
        assert_eq!(role_only.delta_text(), None);

        let usage_only: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[],"usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
        )
        .unwrap();
        assert_eq!(usage_only.delta_text(), None);
    }
}
