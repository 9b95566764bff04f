//! Request envelopes.
//!
//! An envelope is everything one attempt needs to go on the wire: target URL,
//! headers, and the serialized body. Envelopes are assembled fresh per attempt
//! (the credential and therefore the auth material differ between attempts)
//! and never reused across providers. Every call this crate issues is a POST;
//! the providers expose no other verb for streaming completions.

use bytes::Bytes;
use url::Url;

/// A single outgoing request, ready for the strategy chain.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// Target URL.
    pub url: Url,
    /// Header name/value pairs. Values are scrubbed at send time.
    pub headers: Vec<(String, String)>,
    /// Serialized request body.
    pub body: Bytes,
}

impl RequestEnvelope {
    /// Create an envelope for a JSON POST.
    pub fn post(url: Url, body: impl Into<Bytes>) -> Self {
        Self {
            url,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.into(),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up the first header with the given name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
