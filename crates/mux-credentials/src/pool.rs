//! Credential pools.
//!
//! A provider's credentials are stored as one delimited string. The pool
//! parses that string once per call: split on the provider's separator,
//! scrub each entry to printable ASCII, drop empties, preserve order.
//! Entries are never mutated after parse.

use mux_core::printable_ascii;
use secrecy::{ExposeSecret, SecretString};

/// How a provider's stored credential string is split into entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// Split on any run of whitespace.
    Whitespace,
    /// Split on whitespace or commas. The common format for API-key lists.
    WhitespaceOrComma,
    /// Split on newlines only. Used for credentials that contain interior
    /// spaces, such as service-account JSON blobs stored one per line.
    Lines,
}

impl Separator {
    fn split(self, raw: &str) -> Vec<&str> {
        match self {
            Self::Whitespace => raw.split_whitespace().collect(),
            Self::WhitespaceOrComma => raw
                .split(|c: char| c.is_whitespace() || c == ',')
                .collect(),
            Self::Lines => raw.split('\n').collect(),
        }
    }
}

/// An ordered set of credentials for one provider.
#[derive(Debug, Clone, Default)]
pub struct CredentialPool {
    entries: Vec<SecretString>,
}

impl CredentialPool {
    /// Parse a pool from the raw stored string.
    ///
    /// Entries that scrub down to nothing are dropped; the order of the
    /// survivors matches their order in the raw string.
    #[must_use]
    pub fn from_raw(raw: &str, separator: Separator) -> Self {
        let entries = separator
            .split(raw)
            .into_iter()
            .map(printable_ascii)
            .filter(|entry| !entry.is_empty())
            .map(SecretString::new)
            .collect();
        Self { entries }
    }

    /// Number of credentials in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool has no usable credentials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick the credential for a raw cursor position.
    ///
    /// The position is taken modulo the pool size, so any counter value
    /// selects a valid entry. Returns `None` only for an empty pool.
    #[must_use]
    pub fn pick(&self, position: usize) -> Option<&SecretString> {
        if self.entries.is_empty() {
            None
        } else {
            self.entries.get(position % self.entries.len())
        }
    }

    /// Re-join the scrubbed entries one per line, for writing back to the
    /// settings store.
    #[must_use]
    pub fn rejoined(&self) -> String {
        self.entries
            .iter()
            .map(ExposeSecret::expose_secret)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
