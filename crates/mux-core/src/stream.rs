//! The uniform stream-event contract.
//!
//! Every decoder, whatever the wire format underneath, yields this one event
//! shape. The sequence is finite and consumed exactly once: zero or more
//! `Delta` events followed by a single terminal `Done` or `Error`.

use serde::{Deserialize, Serialize};

/// A single decoded unit of streaming output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// An increment of visible assistant text.
    Delta {
        /// The text fragment.
        text: String,
    },
    /// The provider signalled normal end of output.
    Done,
    /// The stream ended abnormally. Carried out-of-band so consumers iterate
    /// without catching; terminal like `Done`.
    Error {
        /// Display-ready description of what went wrong.
        message: String,
    },
}

impl StreamEvent {
    /// Create a delta event.
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Get the delta text if this is a delta event.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Delta { text } => Some(text),
            _ => None,
        }
    }

    /// Whether this event ends the sequence.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}
