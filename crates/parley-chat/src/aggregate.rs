//! Non-streaming completion assembly

use std::fmt::Write;

use parley_core::unix_now;
use parley_upstream::Transcript;
use uuid::Uuid;

use crate::protocol::openai::{AssistantMessage, ChatCompletion, CompletionChoice};

/// Reply text with one `[Image: <url>]` line appended per image
pub fn assistant_content(transcript: &Transcript) -> String {
    let mut content = transcript.text.clone();
    for image in &transcript.images {
        let _ = write!(content, "\n[Image: {image}]");
    }
    content
}

/// Wrap a finished transcript as a single completion
pub fn completion(transcript: &Transcript, model: &str) -> ChatCompletion {
    ChatCompletion {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: "chat.completion",
        created: unix_now(),
        model: model.to_owned(),
        choices: vec![CompletionChoice {
            index: 0,
            message: AssistantMessage {
                role: "assistant",
                content: assistant_content(transcript),
            },
            finish_reason: "stop",
        }],
    }
}
