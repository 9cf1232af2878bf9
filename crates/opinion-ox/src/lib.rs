#![warn(clippy::pedantic, clippy::unwrap_used)]

//! Brand public-opinion classification for social-media posts
//!
//! Image attachments are captioned with a vision model and appended to the
//! post text, which is then sorted by a text model into one of four risk
//! categories (negative complaint, data leak, grey-market abuse, proxy
//! ordering) or "其他".
//!
//! # Example
//!
//! ```rust,no_run
//! use dashscope_ox::DashScope;
//! use opinion_ox::{Analyzer, Payload};
//!
//! #[tokio::main]
//! async fn main() {
//!     let analyzer = Analyzer::new(DashScope::load_from_env(), "dict_example.json");
//!     let payload = Payload {
//!         content: "5r 帮下单霸王茶姬，私信".to_string(),
//!         images: vec![],
//!     };
//!
//!     let output = analyzer.analyze(&payload).await;
//!     println!("{}", serde_json::to_string_pretty(&output).unwrap());
//! }
//! ```

pub mod analysis;
pub mod error;
pub mod prompt;
pub mod reference;

pub use analysis::{
    AnalysisOutput, Analyzer, ChatBackend, DEFAULT_REFERENCE_FILE, Payload,
    resolve_image_reference,
};
pub use error::OpinionError;
pub use reference::{ReferenceCase, load_reference_cases};
