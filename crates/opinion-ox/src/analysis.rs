use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use async_trait::async_trait;
use dashscope_ox::{ChatResult, DashScope, Message, image_data_url};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::OpinionError,
    prompt::{SYSTEM_PROMPT, build_prompt},
    reference::{ReferenceCase, load_reference_cases},
};

/// Default reference-case file name
pub const DEFAULT_REFERENCE_FILE: &str = "dict_example.json";

/// Chat calls the analyzer needs from a model provider
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, messages: Vec<Message>, stream: bool) -> ChatResult;

    /// Short caption of one image; `""` when none could be produced
    async fn describe_image(&self, image_url: &str) -> String;
}

#[async_trait]
impl ChatBackend for DashScope {
    async fn chat(&self, messages: Vec<Message>, stream: bool) -> ChatResult {
        DashScope::chat(self, messages, stream).await
    }

    async fn describe_image(&self, image_url: &str) -> String {
        DashScope::describe_image(self, image_url).await
    }
}

/// One post to classify: its text and any attached images
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(rename = "im_body", default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
}

/// Read an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMessage {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChoice {
    pub message: OutputMessage,
}

/// Result of one analysis, shaped like a chat completion on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutput {
    Completion { choices: Vec<OutputChoice> },
    Error { error: String },
}

impl AnalysisOutput {
    pub fn completion(content: impl Into<String>) -> Self {
        AnalysisOutput::Completion {
            choices: vec![OutputChoice {
                message: OutputMessage {
                    content: content.into(),
                },
            }],
        }
    }

    /// Verdict text returned by the model, if the analysis succeeded
    pub fn content(&self) -> Option<&str> {
        match self {
            AnalysisOutput::Completion { choices } => {
                choices.first().map(|c| c.message.content.as_str())
            }
            AnalysisOutput::Error { .. } => None,
        }
    }
}

/// Turn a raw image reference into something the vision model can fetch.
///
/// http(s) and `data:` URLs pass through; an existing local file is inlined as
/// a base64 `data:` URL.
pub fn resolve_image_reference(raw: &str) -> Result<String, OpinionError> {
    let reference = raw.trim().trim_matches('`').trim();
    if reference.is_empty() {
        return Err(OpinionError::InvalidImage {
            reference: raw.to_string(),
            reason: "empty reference".to_string(),
        });
    }

    if let Ok(url) = Url::parse(reference) {
        match url.scheme() {
            "http" | "https" | "data" => return Ok(reference.to_string()),
            // Windows drive letters parse as one-letter schemes.
            scheme if scheme.len() > 1 => {
                return Err(OpinionError::InvalidImage {
                    reference: reference.to_string(),
                    reason: format!("unsupported URL scheme {scheme:?}"),
                });
            }
            _ => {}
        }
    }

    let path = Path::new(reference);
    if !path.is_file() {
        return Err(OpinionError::InvalidImage {
            reference: reference.to_string(),
            reason: "not a URL and no such file".to_string(),
        });
    }

    image_data_url(path).map_err(|e| OpinionError::InvalidImage {
        reference: reference.to_string(),
        reason: e.to_string(),
    })
}

/// Classifies posts: captions their images, then asks the text model for a verdict
pub struct Analyzer<B> {
    backend: B,
    reference_path: PathBuf,
    stream: bool,
}

impl<B: ChatBackend> Analyzer<B> {
    pub fn new(backend: B, reference_path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            reference_path: reference_path.into(),
            stream: false,
        }
    }

    /// Request the verdict as a streamed response
    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Append a caption for each image to `base_text`, one per line.
    ///
    /// Images that cannot be resolved, or for which no caption comes back,
    /// are skipped.
    pub async fn merge_image_summaries(&self, base_text: &str, images: &[String]) -> String {
        let started = Instant::now();
        let mut merged = base_text.to_string();

        for raw in images {
            let image_url = match resolve_image_reference(raw) {
                Ok(url) => url,
                Err(err) => {
                    error!(error = %err, "skipping image");
                    continue;
                }
            };

            let caption = self.backend.describe_image(&image_url).await;
            if caption.is_empty() {
                warn!(image = %raw.trim(), "no description returned for image");
                continue;
            }
            merged.push('\n');
            merged.push_str(&caption);
        }

        info!(images = images.len(), elapsed = ?started.elapsed(), "image processing finished");
        merged
    }

    /// Reference cases for the prompt; none if the file is unusable
    fn reference_cases(&self) -> Vec<ReferenceCase> {
        load_reference_cases(&self.reference_path).unwrap_or_else(|err| {
            error!(error = %err, "continuing without reference cases");
            Vec::new()
        })
    }

    /// Classify one post
    pub async fn analyze(&self, payload: &Payload) -> AnalysisOutput {
        let input = self
            .merge_image_summaries(&payload.content, &payload.images)
            .await;
        debug!(%input, "classification input");

        let prompt = build_prompt(&input, &self.reference_cases());
        debug!(%prompt, "classification prompt");

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let result = self.backend.chat(messages, self.stream).await;

        if result.ok {
            AnalysisOutput::completion(result.text)
        } else {
            AnalysisOutput::Error {
                error: "舆情分析流程异常: classification request was not answered"
                    .to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_urls_pass_through() {
        assert_eq!(
            resolve_image_reference(" `https://qcloud.dpfile.com/pc/a.jpg` ").unwrap(),
            "https://qcloud.dpfile.com/pc/a.jpg"
        );
        assert_eq!(
            resolve_image_reference("data:image/png;base64,iVBORw==").unwrap(),
            "data:image/png;base64,iVBORw=="
        );
    }

    #[test]
    fn test_resolve_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poster.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let url = resolve_image_reference(path.to_str().unwrap()).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_resolve_rejects_unusable_references() {
        assert!(resolve_image_reference("   ").is_err());
        assert!(resolve_image_reference("ftp://example.com/a.jpg").is_err());
        assert!(resolve_image_reference("missing/poster.jpg").is_err());
    }

    #[test]
    fn test_payload_defaults_and_field_names() {
        let payload: Payload = serde_json::from_str(r#"{"content": "霸王茶姬大跌"}"#).unwrap();
        assert!(payload.images.is_empty());

        let payload: Payload =
            serde_json::from_str(r#"{"im_body": ["https://example.com/a.jpg"]}"#).unwrap();
        assert_eq!(payload.content, "");
        assert_eq!(payload.images.len(), 1);
    }

    #[test]
    fn test_payload_null_fields_default() {
        let payload: Payload =
            serde_json::from_str(r#"{"content": "霸王茶姬", "im_body": null}"#).unwrap();
        assert_eq!(payload.content, "霸王茶姬");
        assert!(payload.images.is_empty());

        let payload: Payload =
            serde_json::from_str(r#"{"content": null, "im_body": ["https://example.com/a.jpg"]}"#)
                .unwrap();
        assert_eq!(payload.content, "");
        assert_eq!(payload.images, vec!["https://example.com/a.jpg".to_string()]);
    }

    #[test]
    fn test_output_shapes() {
        assert_eq!(
            serde_json::to_value(AnalysisOutput::completion("类别4")).unwrap(),
            serde_json::json!({"choices": [{"message": {"content": "类别4"}}]})
        );
        assert_eq!(
            serde_json::to_value(AnalysisOutput::Error {
                error: "boom".to_string()
            })
            .unwrap(),
            serde_json::json!({"error": "boom"})
        );
    }
}
