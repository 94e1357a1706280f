//! Client for the upstream conversational API
//!
//! Builds upstream payloads, signs them through a [`TokenProvider`], posts
//! them and decodes the SSE reply into [`UpstreamFrame`]s.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod error;
pub mod event;
pub mod request;
pub mod sse;
pub mod token;
pub mod transcript;

pub use client::{FrameStream, UpstreamClient};
pub use error::UpstreamError;
pub use event::{UpstreamChoice, UpstreamDelta, UpstreamEvent, UpstreamImage};
pub use request::{GenerationParams, Source, UpstreamMessage, UpstreamRequest};
pub use sse::UpstreamFrame;
pub use token::{Credentials, TokenError, TokenProvider};
pub use transcript::Transcript;
