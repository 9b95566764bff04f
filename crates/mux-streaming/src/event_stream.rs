//! Decoder for the AWS binary event-stream protocol used by Bedrock.
//!
//! Frames are length-prefixed: a 12-byte prelude (total length, header
//! length, prelude CRC), headers, a JSON payload, and a trailing CRC. The
//! payload usually wraps the model event as `{"bytes": "<base64>"}`; the
//! decoded inner JSON differs per model family. CRCs are not verified; a
//! corrupted frame shows up as a failed JSON parse and falls through to a
//! regex scavenger that pulls whatever delta text it can out of the raw
//! bytes.

use crate::CompletionStream;
use async_stream::stream;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::StreamExt;
use mux_core::{BodyStream, StreamEvent};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Total-length word, header-length word, prelude CRC.
const PRELUDE_LEN: usize = 12;
/// Trailing message CRC.
const TRAILER_LEN: usize = 4;
/// The smallest well-formed frame: prelude plus trailer around nothing.
const MIN_FRAME_LEN: usize = PRELUDE_LEN + TRAILER_LEN;
/// Frames beyond this are treated as framing corruption, not data.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[allow(clippy::expect_used)]
static BYTES_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""bytes"\s*:\s*"([A-Za-z0-9+/=]+)""#).expect("literal pattern"));

#[allow(clippy::expect_used)]
static TEXT_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:text|outputText|generation|completion)"\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("literal pattern")
});

enum FrameStep {
    Frame { payload: Vec<u8>, consumed: usize },
    Incomplete,
    Malformed,
}

fn next_frame(buffer: &[u8]) -> FrameStep {
    if buffer.len() < PRELUDE_LEN {
        return FrameStep::Incomplete;
    }
    let total = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    let headers = u32::from_be_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]) as usize;
    if total < MIN_FRAME_LEN || total > MAX_FRAME_LEN || headers > total - MIN_FRAME_LEN {
        return FrameStep::Malformed;
    }
    if buffer.len() < total {
        return FrameStep::Incomplete;
    }
    FrameStep::Frame {
        payload: buffer[PRELUDE_LEN + headers..total - TRAILER_LEN].to_vec(),
        consumed: total,
    }
}

/// Decode one frame payload into zero or more events.
fn decode_payload(payload: &[u8]) -> Vec<StreamEvent> {
    let Ok(outer) = serde_json::from_slice::<Value>(payload) else {
        return scavenge(&String::from_utf8_lossy(payload));
    };
    let inner = match outer.get("bytes").and_then(Value::as_str) {
        Some(encoded) => match STANDARD.decode(encoded) {
            Ok(decoded) => match serde_json::from_slice::<Value>(&decoded) {
                Ok(inner) => inner,
                Err(err) => {
                    debug!(%err, "inner event is not JSON, scavenging");
                    return scavenge(&String::from_utf8_lossy(&decoded));
                }
            },
            Err(err) => {
                debug!(%err, "dropping event payload with invalid base64");
                return Vec::new();
            }
        },
        None => outer,
    };
    inner_event(&inner).into_iter().collect()
}

/// Map one inner model event to a completion event.
fn inner_event(inner: &Value) -> Option<StreamEvent> {
    if inner.get("type").and_then(Value::as_str) == Some("message_stop") {
        return Some(StreamEvent::Done);
    }
    if let Some(kind) = inner.get("__type").and_then(Value::as_str) {
        let message = inner
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("stream exception");
        return Some(StreamEvent::error(format!("{kind}: {message}")));
    }
    delta_text(inner).map(StreamEvent::delta)
}

/// Delta locations across the Bedrock model families.
fn delta_text(inner: &Value) -> Option<String> {
    let text = inner
        .get("delta")
        .and_then(|delta| delta.get("text"))
        .and_then(Value::as_str)
        .or_else(|| inner.get("outputText").and_then(Value::as_str))
        .or_else(|| inner.get("generation").and_then(Value::as_str))
        .or_else(|| inner.get("completion").and_then(Value::as_str))
        .or_else(|| {
            inner
                .get("outputs")
                .and_then(|outputs| outputs.get(0))
                .and_then(|output| output.get("text"))
                .and_then(Value::as_str)
        });
    text.filter(|text| !text.is_empty()).map(ToOwned::to_owned)
}

/// Pull deltas out of bytes whose framing could not be parsed.
fn scavenge(text: &str) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    for capture in BYTES_FIELD.captures_iter(text) {
        if let Ok(decoded) = STANDARD.decode(&capture[1]) {
            if let Ok(inner) = serde_json::from_slice::<Value>(&decoded) {
                events.extend(inner_event(&inner));
            }
        }
    }
    if events.is_empty() {
        for capture in TEXT_FIELD.captures_iter(text) {
            if let Some(text) = unescape(&capture[1]) {
                if !text.is_empty() {
                    events.push(StreamEvent::delta(text));
                }
            }
        }
    }
    events
}

/// Re-interpret a regex-captured fragment as a JSON string literal.
fn unescape(fragment: &str) -> Option<String> {
    serde_json::from_str(&format!("\"{fragment}\"")).ok()
}

/// Decode a Bedrock response-stream body into completion events.
///
/// An inner `message_stop` maps to `Done`; an AWS exception event maps to
/// `Error`; end of body without either still closes with `Done`. When the
/// framing is corrupt the remaining buffer is scavenged by regex so partial
/// responses survive.
pub fn decode_event_stream(body: BodyStream, cancel: CancellationToken) -> CompletionStream {
    CompletionStream::new(stream! {
        let mut body = body;
        let mut buffer: Vec<u8> = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    yield StreamEvent::error(err.to_string());
                    return;
                }
            };
            buffer.extend_from_slice(&bytes);
            loop {
                match next_frame(&buffer) {
                    FrameStep::Frame { payload, consumed } => {
                        buffer.drain(..consumed);
                        for event in decode_payload(&payload) {
                            let terminal = event.is_terminal();
                            yield event;
                            if terminal {
                                return;
                            }
                        }
                    }
                    FrameStep::Incomplete => break,
                    FrameStep::Malformed => {
                        debug!(len = buffer.len(), "unparseable event framing, scavenging buffer");
                        let text = String::from_utf8_lossy(&buffer).into_owned();
                        buffer.clear();
                        for event in scavenge(&text) {
                            let terminal = event.is_terminal();
                            yield event;
                            if terminal {
                                return;
                            }
                        }
                        break;
                    }
                }
            }
        }
        if !buffer.is_empty() {
            for event in scavenge(&String::from_utf8_lossy(&buffer)) {
                let terminal = event.is_terminal();
                yield event;
                if terminal {
                    return;
                }
            }
        }
        if cancel.is_cancelled() {
            return;
        }
        yield StreamEvent::Done;
    })
}
