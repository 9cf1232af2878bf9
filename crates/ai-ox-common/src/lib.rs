#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Shared HTTP plumbing for chat-completion clients
//!
//! Provider crates build on this for the parts every OpenAI-compatible
//! endpoint has in common: decoding error bodies, splitting a streamed body
//! into server-sent-event lines, and the retry schedule between attempts.

pub mod error;
pub mod retry;
pub mod streaming;

pub use error::{CommonRequestError, parse_error_response, snippet};
pub use retry::{LinearBackoff, RetryPolicy};
pub use streaming::{LineReader, SseLine};

/// Re-export common types for convenience
pub use futures_util::stream::BoxStream;
