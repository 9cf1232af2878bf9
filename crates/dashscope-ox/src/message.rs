use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub type Messages = Vec<Message>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUrl {
    pub url: String,
}

/// One element of a multi-part message body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// Message body: plain text or an ordered list of text/image parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_owned())
    }
}

impl From<Vec<ContentPart>> for Content {
    fn from(parts: Vec<ContentPart>) -> Self {
        Content::Parts(parts)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<Content>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Read a local image into a `data:` URL accepted wherever an image URL is.
pub fn image_data_url<P: AsRef<Path>>(path: P) -> Result<String, std::io::Error> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let media_type = mime_guess::from_path(path).first_or_octet_stream();
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    Ok(format!("data:{media_type};base64,{encoded}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_message_serialization() {
        let msg = Message::system("You are a helpful assistant.");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "system", "content": "You are a helpful assistant."})
        );
    }

    #[test]
    fn test_vision_message_serialization() {
        let msg = Message::user(vec![
            ContentPart::image_url("https://example.com/cup.jpg"),
            ContentPart::text("describe"),
        ]);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "image_url", "image_url": {"url": "https://example.com/cup.jpg"}},
                    {"type": "text", "text": "describe"}
                ]
            })
        );
    }

    #[test]
    fn test_role_strings() {
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
    }

    #[test]
    fn test_image_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let url = image_data_url(&path).unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_image_data_url_missing_file() {
        assert!(image_data_url("/definitely/not/here.jpg").is_err());
    }
}
