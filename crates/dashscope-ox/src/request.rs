use bon::Builder;
use serde::Serialize;

use crate::message::{Message, Messages};

/// Body of a `chat/completions` call.
///
/// Unset optional fields are left out of the JSON, so a bare
/// `{model, messages}` request lets the server pick its defaults.
#[derive(Debug, Clone, Serialize, Builder)]
#[builder(builder_type(vis = "pub"), state_mod(vis = "pub"))]
pub struct ChatRequest {
    #[builder(field)]
    pub messages: Messages,
    #[builder(into)]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl<S: chat_request_builder::State> ChatRequestBuilder<S> {
    pub fn messages(mut self, messages: impl IntoIterator<Item = impl Into<Message>>) -> Self {
        self.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn message(mut self, message: impl Into<Message>) -> Self {
        self.messages.push(message.into());
        self
    }
}

impl ChatRequest {
    /// Whether the response arrives as server-sent events
    pub fn is_streaming(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::builder()
            .model("qwen3-235b-a22b")
            .messages(vec![Message::system("be brief"), Message::user("hi")])
            .stream(true)
            .max_tokens(16384)
            .temperature(0.0)
            .build();

        assert_eq!(request.messages.len(), 2);
        assert!(request.is_streaming());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ],
                "model": "qwen3-235b-a22b",
                "stream": true,
                "max_tokens": 16384,
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let request = ChatRequest::builder()
            .model("qwen-vl-max-latest")
            .message(Message::user("hi"))
            .build();

        assert!(!request.is_streaming());
        let value = serde_json::to_value(&request).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("model"));
        assert!(object.contains_key("messages"));
    }
}
