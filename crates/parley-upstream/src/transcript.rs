use futures_util::{Stream, StreamExt};

use crate::error::UpstreamError;
use crate::event::UpstreamEvent;
use crate::sse::UpstreamFrame;

/// Everything the upstream said in one reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    /// Concatenated text deltas
    pub text: String,
    /// Image references in arrival order
    pub images: Vec<String>,
}

impl Transcript {
    pub fn push(&mut self, event: &UpstreamEvent) {
        for choice in &event.choices {
            if let Some(content) = &choice.delta.content {
                self.text.push_str(content);
            }
            self.images.extend(choice.delta.images.iter().map(|i| i.data.clone()));
        }
    }

    /// Drain a frame stream until `Done` or its end
    ///
    /// # Errors
    ///
    /// Returns the stream error if the reply broke off
    pub async fn collect<S>(frames: S) -> Result<Self, UpstreamError>
    where
        S: Stream<Item = Result<UpstreamFrame, UpstreamError>>,
    {
        let mut transcript = Self::default();
        let mut frames = std::pin::pin!(frames);

        while let Some(frame) = frames.next().await {
            match frame? {
                UpstreamFrame::Event(event) => transcript.push(&event),
                UpstreamFrame::Done => break,
            }
        }

        Ok(transcript)
    }
}
