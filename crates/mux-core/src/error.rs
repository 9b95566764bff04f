//! Error types for llm-mux.

use thiserror::Error;

/// Result type for llm-mux operations.
pub type MuxResult<T> = std::result::Result<T, MuxError>;

/// Maximum number of characters of a provider error body kept for display.
const ERROR_BODY_LIMIT: usize = 300;

/// Errors that can occur across the adapter pipeline.
///
/// The variants mirror the failure taxonomy the rotation orchestrator
/// classifies against: only [`MuxError::Provider`] with status 429 or 529 and
/// [`MuxError::Transport`] are retryable; everything else is terminal.
#[derive(Error, Debug)]
pub enum MuxError {
    /// Configuration error: missing model id, missing credential, bad URL.
    /// Surfaced immediately, never retried.
    #[error("configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The provider returned a real HTTP response with a failure status.
    #[error("{provider} returned HTTP {status}: {body}")]
    Provider {
        /// Display name of the provider.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for display.
        body: String,
    },

    /// The request never produced an HTTP response (connect/TLS/socket
    /// failure). Always retryable with the next credential.
    #[error("{provider} transport failure: {message}")]
    Transport {
        /// Display name of the provider.
        provider: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The response stream ended abnormally after headers were received.
    #[error("stream error: {message}")]
    Stream {
        /// Description of the stream failure.
        message: String,
    },

    /// Settings store read or write failed.
    #[error("settings store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// Internal error, never expected in steady state.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },
}

impl MuxError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a provider error from a response status and body.
    ///
    /// The body is flattened to one line and truncated so the result is
    /// always fit for direct display in a host UI.
    pub fn provider(provider: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Provider {
            provider: provider.into(),
            status,
            body: truncate_for_display(body),
        }
    }

    /// Create a transport error.
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// Create a settings store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check whether the next credential in the pool may be tried.
    ///
    /// Retryable means a transient provider-side condition: HTTP 429
    /// (rate limited), HTTP 529 (overloaded), or a transport failure that
    /// produced no response at all. Any other status is terminal; rotating
    /// credentials will not fix a malformed request or a revoked key.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { status, .. } => matches!(status, 429 | 529),
            Self::Transport { .. } => true,
            _ => false,
        }
    }

    /// Get the HTTP status code if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a cached derived token for the attempted credential should be
    /// discarded. True for auth rejections (401/403).
    #[must_use]
    pub fn invalidates_token(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl From<serde_json::Error> for MuxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("serialization failed: {err}"),
        }
    }
}

/// Flatten a response body to a single trimmed line capped at
/// [`ERROR_BODY_LIMIT`] characters.
fn truncate_for_display(body: &str) -> String {
    let flat: String = body
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() <= ERROR_BODY_LIMIT {
        flat
    } else {
        let mut out: String = flat.chars().take(ERROR_BODY_LIMIT).collect();
        out.push_str("...");
        out
    }
}
