//! Decoding of the upstream SSE reply

use std::fmt::Display;
use std::pin::Pin;

use futures_util::{Stream, StreamExt, future, stream};

use crate::error::UpstreamError;
use crate::event::UpstreamEvent;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// One element of the decoded upstream feed
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamFrame {
    Event(UpstreamEvent),
    /// Terminal `[DONE]` sentinel
    Done,
}

/// Decode an upstream byte stream into frames
///
/// Every `data:` line is decoded as soon as its newline arrives, and a
/// trailing line without a newline is decoded at end of input. Lines that
/// fail to decode are logged and skipped. The sequence ends after `Done` or
/// after the first transport error.
pub fn decode<S, B, E>(bytes: S) -> impl Stream<Item = Result<UpstreamFrame, UpstreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    lines(bytes)
        .filter_map(|line| {
            future::ready(match line {
                Ok(line) => decode_line(&line).map(Ok),
                Err(e) => Some(Err(e)),
            })
        })
        .scan(false, |finished, item| {
            if *finished {
                return future::ready(None);
            }
            *finished = matches!(item, Ok(UpstreamFrame::Done) | Err(_));
            future::ready(Some(item))
        })
}

struct LineReader<S> {
    bytes: Pin<Box<S>>,
    buffer: Vec<u8>,
    eof: bool,
}

/// Split a byte stream on `\n`, stripping a trailing `\r`
fn lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, UpstreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let reader = LineReader { bytes: Box::pin(bytes), buffer: Vec::new(), eof: false };

    stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(pos) = reader.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = reader.buffer.drain(..=pos).collect();
                return Some((Ok(to_line(&line)), reader));
            }
            if reader.eof {
                if reader.buffer.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut reader.buffer);
                return Some((Ok(to_line(&line)), reader));
            }

            match reader.bytes.next().await {
                Some(Ok(chunk)) => reader.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    reader.buffer.clear();
                    reader.eof = true;
                    return Some((Err(UpstreamError::Stream(e.to_string())), reader));
                }
                None => reader.eof = true,
            }
        }
    })
}

fn to_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim_end_matches(['\n', '\r']).to_owned()
}

fn decode_line(line: &str) -> Option<UpstreamFrame> {
    let data = line.strip_prefix(DATA_PREFIX)?.trim();
    if data.is_empty() {
        return None;
    }
    if data == DONE_SENTINEL {
        return Some(UpstreamFrame::Done);
    }

    match serde_json::from_str::<UpstreamEvent>(data) {
        Ok(event) => Some(UpstreamFrame::Event(event)),
        Err(e) => {
            tracing::debug!(error = %e, data = %data, "skipping unparseable upstream line");
            None
        }
    }
}
