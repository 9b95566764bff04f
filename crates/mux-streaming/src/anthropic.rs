//! Decoder for Anthropic's tagged-event message stream.
//!
//! Every `data:` line carries a JSON object whose `type` field names the
//! event. Text arrives only in `content_block_delta` events carrying a
//! `text_delta`; the bracketing lifecycle events (`message_start`,
//! `content_block_start`, `ping`, ...) are acknowledged and dropped.

use crate::sse::{data_payload, sse_lines};
use crate::CompletionStream;
use async_stream::stream;
use futures::StreamExt;
use mux_core::{BodyStream, StreamEvent};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    ContentBlockDelta { delta: BlockDelta },
    MessageStop,
    Error { error: WireError },
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    // thinking_delta, input_json_delta and future kinds carry no user text
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl WireError {
    fn describe(self) -> String {
        match (self.kind.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.kind, self.message),
            (false, true) => self.kind,
            (true, false) => self.message,
            (true, true) => "provider signalled an unnamed stream error".to_owned(),
        }
    }
}

/// Decode an Anthropic event stream into completion events.
///
/// `message_stop` maps to `Done` and a wire `error` event to `Error`; both
/// end the stream. Unknown event types are skipped so protocol additions
/// never break playback.
pub fn decode_anthropic(body: BodyStream, cancel: CancellationToken) -> CompletionStream {
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
            let event = match serde_json::from_str::<WireEvent>(data) {
                Ok(event) => event,
                Err(err) => {
                    debug!(%err, "skipping undecodable anthropic event");
                    continue;
                }
            };
            match event {
                WireEvent::ContentBlockDelta {
                    delta: BlockDelta::TextDelta { text },
                } => {
                    if !text.is_empty() {
                        yield StreamEvent::delta(text);
                    }
                }
                WireEvent::MessageStop => {
                    yield StreamEvent::Done;
                    return;
                }
                WireEvent::Error { error } => {
                    yield StreamEvent::error(error.describe());
                    return;
                }
                WireEvent::ContentBlockDelta { .. } | WireEvent::Ignored => {}
            }
        }
        if cancel.is_cancelled() {
            return;
        }
        yield StreamEvent::Done;
    })
}
