//! Decoder for `data:`-line server-sent-event streams.
//!
//! OpenAI-compatible endpoints and Gemini's `alt=sse` endpoints share the
//! same framing (one JSON chunk per `data:` line) and differ only in where
//! the delta text sits inside the chunk, so one decoder serves both with a
//! [`DeltaPath`] selector.

use crate::CompletionStream;
use async_stream::stream;
use futures::stream::BoxStream;
use futures::StreamExt;
use mux_core::{BodyStream, MuxError, StreamEvent};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The OpenAI end-of-stream sentinel.
const DONE_SENTINEL: &str = "[DONE]";

/// Where the delta text lives inside a streamed JSON chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaPath {
    /// `choices[0].delta.content`, the OpenAI chat-completions shape.
    OpenAiChat,
    /// `candidates[0].content.parts[*].text`, the Gemini shape. These
    /// streams carry no `[DONE]` sentinel and end at connection close.
    GeminiCandidates,
}

impl DeltaPath {
    fn extract(self, chunk: &Value) -> Option<String> {
        match self {
            Self::OpenAiChat => chunk
                .get("choices")?
                .get(0)?
                .get("delta")?
                .get("content")?
                .as_str()
                .map(ToOwned::to_owned),
            Self::GeminiCandidates => {
                let parts = chunk
                    .get("candidates")?
                    .get(0)?
                    .get("content")?
                    .get("parts")?
                    .as_array()?;
                let text: String = parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect();
                Some(text)
            }
        }
    }
}

/// Decode a `data:`-line SSE body into completion events.
///
/// Undecodable lines are skipped, not fatal: a provider that interleaves
/// comments, `event:` lines, or malformed chunks still yields every delta
/// it did manage to send. A body read error ends the stream with an
/// `Error` event; cancellation ends it with no terminal event at all.
pub fn decode_sse(body: BodyStream, path: DeltaPath, cancel: CancellationToken) -> CompletionStream {
    CompletionStream::new(stream! {
        let mut lines = sse_lines(body, cancel.clone());
        while let Some(line) = lines.next().await {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    yield StreamEvent::error(err.to_string());
                    return;
                }
            };
            let Some(data) = data_payload(&line) else { continue };
            if data == DONE_SENTINEL {
                yield StreamEvent::Done;
                return;
            }
            match serde_json::from_str::<Value>(data) {
                Ok(chunk) => {
                    if let Some(text) = path.extract(&chunk) {
                        if !text.is_empty() {
                            yield StreamEvent::delta(text);
                        }
                    }
                }
                Err(err) => debug!(%err, "skipping undecodable stream line"),
            }
        }
        if cancel.is_cancelled() {
            return;
        }
        yield StreamEvent::Done;
    })
}

/// Split a body into trimmed lines, honouring cancellation between reads.
///
/// Lines are cut at `\n` before any text conversion, so multi-byte
/// characters split across network chunks survive intact. The sequence
/// simply ends when the token fires; callers distinguish that from normal
/// end-of-body by checking the token themselves.
pub(crate) fn sse_lines(
    body: BodyStream,
    cancel: CancellationToken,
) -> BoxStream<'static, Result<String, MuxError>> {
    stream! {
        let mut body = body;
        let mut buffer: Vec<u8> = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            match chunk {
                Ok(bytes) => buffer.extend_from_slice(&bytes),
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
            while let Some(at) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=at).collect();
                yield Ok(String::from_utf8_lossy(&line).trim().to_owned());
            }
        }
        // A final line without a trailing newline still counts.
        if !buffer.is_empty() {
            yield Ok(String::from_utf8_lossy(&buffer).trim().to_owned());
        }
    }
    .boxed()
}

/// The payload of a `data:` line, or `None` for comments and other fields.
pub(crate) fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}
