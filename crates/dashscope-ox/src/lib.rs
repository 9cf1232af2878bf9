#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! DashScope chat-completion client for Rust
//!
//! Talks to the OpenAI-compatible endpoint of Alibaba Cloud DashScope with:
//! - Bearer authentication from explicit configuration or `DASHSCOPE_API_KEY`
//! - Streamed (server-sent events) and non-streamed responses
//! - Linear-backoff retries on transport failures
//! - Text chat and single-image description entry points
//!
//! Calls never fail: [`DashScope::send`] logs every problem and returns a
//! [`ChatResult`] whose `ok` flag tells failure apart from an empty answer.
//!
//! # Example
//!
//! ```rust,no_run
//! use dashscope_ox::{DashScope, Message};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = DashScope::load_from_env();
//!
//!     let text = client
//!         .text_chat(
//!             vec![
//!                 Message::system("You are a helpful assistant."),
//!                 Message::user("用一句话总结人工智能的核心作用"),
//!             ],
//!             true,
//!         )
//!         .await;
//!     println!("{text}");
//! }
//! ```

pub mod error;
mod internal;
pub mod message;
pub mod model;
pub mod request;
pub mod response;
pub mod stream;

// Re-export main types
pub use ai_ox_common::RetryPolicy;
pub use error::DashScopeRequestError;
pub use message::{Content, ContentPart, Message, Role, image_data_url};
pub use model::Model;
pub use request::ChatRequest;
pub use response::{ChatCompletionChunk, ChatResponse};

use backon::Retryable;
use bon::Builder;
use core::fmt;
use futures_util::{FutureExt, future::BoxFuture};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, error, warn};

use crate::internal::DashScopeRequestHelper;

/// Environment variable holding the bearer credential
pub const API_KEY_ENV: &str = "DASHSCOPE_API_KEY";
/// Environment variable overriding the endpoint base URL
pub const BASE_URL_ENV: &str = "DASHSCOPE_BASE_URL";

const BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// `max_tokens` sent with every text chat
pub const TEXT_MAX_TOKENS: u32 = 16384;

const VISION_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Instruction sent with every image: describe briefly, call out anything
/// brand related, stay under roughly 100 characters.
pub const CAPTION_PROMPT: &str =
    "简要描述图片内容，如果发现有霸王茶姬相关的内容，则需要描述出来，字数尽量不超过100字";

/// Waits between retry attempts. Swappable so tests can run on a fake clock.
pub type SleepFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

fn tokio_sleep() -> SleepFn {
    Arc::new(|delay: Duration| tokio::time::sleep(delay).boxed())
}

/// Adapts a [`SleepFn`] to backon's sleeper
struct InjectedSleep(SleepFn);

impl backon::Sleeper for InjectedSleep {
    type Sleep = BoxFuture<'static, ()>;

    fn sleep(&self, dur: Duration) -> Self::Sleep {
        (self.0)(dur)
    }
}

/// Outcome of one call: the answer text and whether the call succeeded.
///
/// `text` is empty whenever `ok` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatResult {
    pub text: String,
    pub ok: bool,
}

impl ChatResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: true,
        }
    }

    pub fn failure() -> Self {
        Self::default()
    }
}

#[derive(Clone, Builder)]
pub struct DashScope {
    #[builder(into)]
    pub(crate) api_key: Option<String>,
    #[builder(default)]
    pub(crate) client: reqwest::Client,
    #[builder(default = BASE_URL.to_string(), into)]
    pub(crate) base_url: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub(crate) timeout: Duration,
    #[builder(default)]
    pub(crate) retry: RetryPolicy,
    #[builder(default = Model::Qwen3_235bA22b, into)]
    pub(crate) text_model: Model,
    #[builder(default = Model::QwenVlMaxLatest, into)]
    pub(crate) vision_model: Model,
    #[builder(default = tokio_sleep())]
    pub(crate) sleep: SleepFn,
}

impl DashScope {
    /// Create a new DashScope client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Build a client from the environment (and a `.env` file, if present).
    ///
    /// A missing key is not an error here; every call made with such a client
    /// fails with [`DashScopeRequestError::MissingCredential`].
    pub fn load_from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "could not load .env file");
            }
        }

        Self::builder()
            .maybe_api_key(std::env::var(API_KEY_ENV).ok())
            .maybe_base_url(std::env::var(BASE_URL_ENV).ok())
            .build()
    }

    /// Create request helper for internal use
    fn request_helper(&self) -> Result<DashScopeRequestHelper, DashScopeRequestError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(DashScopeRequestError::MissingCredential)?;

        Ok(DashScopeRequestHelper::new(
            self.client.clone(),
            &self.base_url,
            api_key,
            self.timeout,
        ))
    }
}

impl DashScope {
    /// Send a request, retrying transport failures per the retry policy.
    pub async fn try_send(&self, request: &ChatRequest) -> Result<String, DashScopeRequestError> {
        let helper = self.request_helper()?;

        (|| helper.send_chat_request(request))
            .retry(self.retry)
            .sleep(InjectedSleep(Arc::clone(&self.sleep)))
            .when(DashScopeRequestError::is_retryable)
            .notify(|err, delay| {
                warn!(
                    model = %request.model,
                    error = %err,
                    body = ?err.body(),
                    retry_in = ?delay,
                    "DashScope request failed; retrying"
                );
            })
            .await
    }

    /// Send a request and log, rather than return, anything that goes wrong.
    ///
    /// A response without the expected shape counts as an empty answer, not
    /// a failure.
    pub async fn send(&self, request: &ChatRequest) -> ChatResult {
        let started = Instant::now();

        match self.try_send(request).await {
            Ok(text) => {
                debug!(
                    model = %request.model,
                    stream = request.is_streaming(),
                    chars = text.chars().count(),
                    elapsed = ?started.elapsed(),
                    "DashScope request completed"
                );
                ChatResult::success(text)
            }
            Err(err @ DashScopeRequestError::MalformedResponse(_)) => {
                warn!(model = %request.model, error = %err, "DashScope response had an unexpected shape");
                ChatResult::success(String::new())
            }
            Err(DashScopeRequestError::MissingCredential) => {
                error!(env = API_KEY_ENV, "DashScope API key is not set");
                ChatResult::failure()
            }
            Err(err) => {
                error!(
                    model = %request.model,
                    error = %err,
                    body = ?err.body(),
                    attempts = self.retry.max_attempts,
                    elapsed = ?started.elapsed(),
                    "DashScope request failed after all attempts"
                );
                ChatResult::failure()
            }
        }
    }

    /// Text chat with the configured text model, keeping the status flag
    pub async fn chat(
        &self,
        messages: impl IntoIterator<Item = impl Into<Message>>,
        stream: bool,
    ) -> ChatResult {
        let request = ChatRequest::builder()
            .model(self.text_model.as_str())
            .messages(messages)
            .stream(stream)
            .max_tokens(TEXT_MAX_TOKENS)
            .temperature(0.0)
            .build();

        self.send(&request).await
    }

    /// Text chat; returns `""` on failure
    pub async fn text_chat(
        &self,
        messages: impl IntoIterator<Item = impl Into<Message>>,
        stream: bool,
    ) -> String {
        self.chat(messages, stream).await.text
    }

    /// Caption one image with the configured vision model; returns `""` on failure
    pub async fn describe_image(&self, image_url: &str) -> String {
        if !self.vision_model.supports_vision() {
            warn!(model = %self.vision_model, "vision model may not accept image input");
        }

        let request = ChatRequest::builder()
            .model(self.vision_model.as_str())
            .messages([
                Message::system(vec![ContentPart::text(VISION_SYSTEM_PROMPT)]),
                Message::user(vec![
                    ContentPart::image_url(image_url),
                    ContentPart::text(CAPTION_PROMPT),
                ]),
            ])
            .build();

        self.send(&request).await.text
    }
}

impl fmt::Debug for DashScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashScope")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("text_model", &self.text_model)
            .field("vision_model", &self.vision_model)
            .finish_non_exhaustive()
    }
}
