//! `OpenAI` wire format types
//!
//! Pure serde structs for the chat completion and model listing APIs, used
//! only at the HTTP boundary.

pub mod openai;
