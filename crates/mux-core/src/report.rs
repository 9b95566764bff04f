//! Host-facing call reports.

use crate::error::MuxError;
use serde::{Deserialize, Serialize};

/// The result shape handed back to a host UI.
///
/// On failure, `content` is a short diagnostic string (provider name, HTTP
/// status, truncated body) ready for direct rendering, never a debug dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    /// Whether the call produced usable output.
    pub success: bool,
    /// The completion text on success, or a user-facing diagnostic on
    /// failure.
    pub content: String,
}

impl HostReport {
    /// Create a success report carrying the completion text.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
        }
    }

    /// Create a failure report from an error.
    #[must_use]
    pub fn failure(error: &MuxError) -> Self {
        Self {
            success: false,
            content: error.to_string(),
        }
    }
}

impl From<&MuxError> for HostReport {
    fn from(error: &MuxError) -> Self {
        Self::failure(error)
    }
}
