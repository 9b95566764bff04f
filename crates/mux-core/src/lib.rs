//! # Mux Core
//!
//! Core types and error handling for llm-mux.
//!
//! This crate provides the foundational types shared by every other crate in
//! the workspace:
//! - Chat turns and content parts
//! - The uniform stream-event contract
//! - The three-way transport fetch outcome
//! - The workspace error type
//! - Text hygiene helpers for credentials and header values

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod outcome;
pub mod report;
pub mod stream;
pub mod text;
pub mod turn;

// Re-export commonly used types
pub use error::{MuxError, MuxResult};
pub use outcome::{BodyStream, FetchOutcome, HttpResponse};
pub use report::HostReport;
pub use stream::StreamEvent;
pub use text::{is_printable_ascii, printable_ascii};
pub use turn::{ChatTurn, ContentPart, TurnContent, TurnRole};
