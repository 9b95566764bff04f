//! Chat turn types.
//!
//! This module defines the host-neutral conversation format that the request
//! formatter maps into each provider's native body shape.

use serde::{Deserialize, Deserializer, Serialize};

/// A single conversation turn: who spoke, and what they said.
///
/// Turns are immutable once constructed. The host builds the list per user
/// turn; the formatter reads it without modifying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Role of the turn author
    pub role: TurnRole,

    /// Content of the turn
    pub content: TurnContent,
}

impl ChatTurn {
    /// Create a system turn
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: TurnContent::Text(content.into()),
        }
    }

    /// Create a user turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: TurnContent::Text(content.into()),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: TurnContent::Text(content.into()),
        }
    }

    /// Get the text content if this turn is plain text
    #[must_use]
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text(s) => Some(s),
            TurnContent::Parts(_) => None,
        }
    }

    /// Flatten the content to a single string.
    ///
    /// Text parts are joined with newlines; opaque attachments contribute
    /// nothing here and are handled (or skipped) by each provider mapping.
    #[must_use]
    pub fn flattened_text(&self) -> String {
        match &self.content {
            TurnContent::Text(s) => s.clone(),
            TurnContent::Parts(parts) => parts
                .iter()
                .filter_map(ContentPart::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Turn role.
///
/// Deserialization coerces any unrecognized role name to `User` rather than
/// failing; see [`TurnRole::from_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// System instruction
    System,
    /// User turn
    User,
    /// Assistant turn
    Assistant,
}

impl TurnRole {
    /// Parse a role name, coercing anything unknown to `User`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "system" => Self::System,
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }

    /// The lowercase wire name of this role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl<'de> Deserialize<'de> for TurnRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn content (text or multi-part)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    /// Simple text content
    Text(String),
    /// Multi-part content
    Parts(Vec<ContentPart>),
}

impl TurnContent {
    /// Get as text if this is text content
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Parts(_) => None,
        }
    }

    /// Check if content is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Parts(parts) => parts.is_empty(),
        }
    }
}

/// Content part for multi-part turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content part
    Text {
        /// The text content
        text: String,
    },
    /// Provider-opaque attachment, forwarded verbatim where a provider
    /// mapping supports it
    Attachment {
        /// The attachment payload in whatever shape the host captured it
        payload: serde_json::Value,
    },
}

impl ContentPart {
    /// Get the text if this is a text part
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Attachment { .. } => None,
        }
    }
}
