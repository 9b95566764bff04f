//! # Mux Streaming
//!
//! Wire-format decoders for llm-mux and the uniform stream they all feed.
//!
//! Three decoders cover every supported provider:
//! - [`decode_sse`] for `data:`-line streams (OpenAI-compatible and Gemini,
//!   selected by [`DeltaPath`])
//! - [`decode_anthropic`] for Anthropic's tagged event stream
//! - [`decode_event_stream`] for Bedrock's binary event-stream framing
//!
//! Each returns a [`CompletionStream`] of `Delta` events closed by exactly
//! one terminal `Done` or `Error` event, except when cancelled, in which
//! case the stream ends with no terminal at all and the text collected so
//! far stands.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod anthropic;
pub mod event_stream;
pub mod sse;
pub mod stream;

// Re-export commonly used types
pub use anthropic::decode_anthropic;
pub use event_stream::decode_event_stream;
pub use sse::{decode_sse, DeltaPath};
pub use stream::CompletionStream;
