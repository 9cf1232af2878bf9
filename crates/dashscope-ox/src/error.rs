use ai_ox_common::CommonRequestError;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when making requests to the DashScope API
#[derive(Debug, Error)]
pub enum DashScopeRequestError {
    /// No bearer credential configured; nothing was sent
    #[error("Missing API key ({} is not set)", crate::API_KEY_ENV)]
    MissingCredential,

    /// Connection failure, timeout or interrupted body
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// Body was not JSON, or JSON without the expected `choices`
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// One streamed line could not be decoded
    #[error("Malformed stream chunk: {0}")]
    MalformedStreamChunk(String),
}

impl DashScopeRequestError {
    /// Transport-level failures are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Api { .. })
    }

    /// Structured error body returned by the server, if any
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl From<CommonRequestError> for DashScopeRequestError {
    fn from(err: CommonRequestError) -> Self {
        match err {
            CommonRequestError::Http(e) => DashScopeRequestError::Transport(e),
            CommonRequestError::Api {
                status,
                message,
                body,
            } => DashScopeRequestError::Api {
                status,
                message,
                body,
            },
        }
    }
}
