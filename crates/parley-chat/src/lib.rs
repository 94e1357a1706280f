//! OpenAI-compatible chat completions over the upstream API
//!
//! Inbound requests are normalized into upstream messages, sent through
//! [`parley_upstream::UpstreamClient`], and the reply is either re-encoded
//! chunk by chunk or aggregated into a single completion.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod protocol;
pub mod router;
pub mod stream;

pub use error::ChatError;
pub use router::{ChatState, WELCOME_HTML, chat_router};
