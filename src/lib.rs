//! # llm-mux
//!
//! Unified streaming completion adapter for multi-provider LLM APIs.
//!
//! One call surface over seven providers (OpenAI, DeepSeek, OpenRouter,
//! Anthropic, Gemini, Vertex AI, AWS Bedrock): credentials are pooled and
//! rotated on rate limits, requests are formatted to each provider's native
//! schema, sends walk a transport fallback chain, and every response is
//! decoded into one stream-event shape whatever the wire format underneath.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use llm_mux::{ChatTurn, GenerationConfig, MemoryStore, Mux, ProviderKind, SettingsStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), llm_mux::MuxError> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.set("anthropic.api_key", "sk-ant-your-key").await?;
//!
//!     let mux = Mux::new(store)?;
//!     let text = mux
//!         .chat(
//!             ProviderKind::Anthropic,
//!             &[ChatTurn::user("Say hello.")],
//!             &GenerationConfig::new("claude-sonnet-4-20250514"),
//!             &CancellationToken::new(),
//!         )
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use llm_mux::{ChatTurn, GenerationConfig, MemoryStore, Mux, ProviderKind, SettingsStore, StreamEvent};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), llm_mux::MuxError> {
//!     let store = Arc::new(MemoryStore::new());
//!     store.set("openai.api_key", "sk-your-key").await?;
//!
//!     let mux = Mux::new(store)?;
//!     let cancel = CancellationToken::new();
//!     let mut stream = mux
//!         .stream_chat(
//!             ProviderKind::OpenAi,
//!             &[ChatTurn::user("Tell me a story.")],
//!             &GenerationConfig::new("gpt-4o"),
//!             &cancel,
//!         )
//!         .await?;
//!
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             StreamEvent::Delta { text } => print!("{text}"),
//!             StreamEvent::Done => break,
//!             StreamEvent::Error { message } => eprintln!("stream failed: {message}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Dropping `cancel` is not enough to stop an in-flight call; cancel the
//! token and the stream ends without a terminal event, keeping whatever
//! text already arrived.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use mux_core::{
    ChatTurn, ContentPart, HostReport, MuxError, MuxResult, StreamEvent, TurnContent, TurnRole,
};
pub use mux_credentials::{
    store_credential, CursorStore, InMemoryCursors, MemoryStore, SettingsStore, TokenBroker,
};
pub use mux_providers::{
    AwsCredential, GenerationConfig, Mux, ProviderKind, ProviderProfile, WireFormat,
};
pub use mux_streaming::CompletionStream;
pub use mux_transport::{RoutePolicy, TransportConfig};

pub use mux_core;
pub use mux_credentials;
pub use mux_providers;
pub use mux_streaming;
pub use mux_transport;
