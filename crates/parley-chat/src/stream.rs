//! Re-encoding of upstream frames as `OpenAI` stream chunks

use futures_util::{Stream, StreamExt, stream};
use parley_core::unix_now;
use parley_upstream::{UpstreamError, UpstreamEvent, UpstreamFrame};
use uuid::Uuid;

use crate::protocol::openai::{ChatCompletionChunk, ChunkChoice, ChunkDelta};

/// One SSE frame to forward to the caller
#[derive(Debug, Clone)]
pub enum ReencodedFrame {
    Chunk(ChatCompletionChunk),
    /// Forwarded as the literal `[DONE]` sentinel
    Done,
}

/// Builds `OpenAI` chunks from upstream events
#[derive(Debug, Clone)]
pub struct Reencoder {
    fallback_model: String,
}

impl Reencoder {
    /// `fallback_model` is reported when an event does not name its model
    pub const fn new(fallback_model: String) -> Self {
        Self { fallback_model }
    }

    /// Chunks for one event, in emission order
    ///
    /// Per choice: one chunk for non-empty text, then one placeholder chunk
    /// per image.
    pub fn encode(&self, event: &UpstreamEvent) -> Vec<ChatCompletionChunk> {
        let model = event.model.as_deref().unwrap_or(&self.fallback_model);
        let mut chunks = Vec::new();

        for choice in &event.choices {
            if let Some(content) = choice.delta.content.as_deref().filter(|c| !c.is_empty()) {
                chunks.push(chunk(model, content.to_owned()));
            }
            for image in &choice.delta.images {
                chunks.push(chunk(model, format!("[Image at {}]", image.data)));
            }
        }

        chunks
    }
}

/// Map decoded upstream frames to caller frames, preserving order
///
/// Upstream errors pass through so the caller can abort the response.
pub fn reencode<S>(frames: S, model: String) -> impl Stream<Item = Result<ReencodedFrame, UpstreamError>> + Send
where
    S: Stream<Item = Result<UpstreamFrame, UpstreamError>> + Send,
{
    let encoder = Reencoder::new(model);

    frames
        .map(move |frame| match frame {
            Ok(UpstreamFrame::Event(event)) => encoder
                .encode(&event)
                .into_iter()
                .map(|c| Ok(ReencodedFrame::Chunk(c)))
                .collect(),
            Ok(UpstreamFrame::Done) => vec![Ok(ReencodedFrame::Done)],
            Err(e) => vec![Err(e)],
        })
        .flat_map(stream::iter)
}

fn chunk(model: &str, content: String) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: "chat.completion.chunk",
        created: unix_now(),
        model: model.to_owned(),
        system_fingerprint: system_fingerprint(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: ChunkDelta { content },
        }],
    }
}

/// `fp_` followed by 12 hex digits
fn system_fingerprint() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("fp_{}", &hex[..12])
}
