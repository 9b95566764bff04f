//! Transport fetch outcomes.
//!
//! Every send resolves to exactly one of three shapes: a real HTTP response
//! (any status, including 4xx/5xx), a transport failure that produced no
//! response at all, or a cancellation. The fallback chain and the rotation
//! orchestrator both branch on this distinction with a plain match instead of
//! probing response fields.

use crate::error::MuxError;
use bytes::Bytes;
use futures::stream::BoxStream;

/// The body of a response as a lazily-read byte stream.
///
/// Consumed exactly once, by exactly one decoder.
pub type BodyStream = BoxStream<'static, Result<Bytes, MuxError>>;

/// A real HTTP response: the target was reached and answered.
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as lossy name/value strings.
    pub headers: Vec<(String, String)>,
    /// The response body.
    pub body: BodyStream,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Look up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Collect the whole body into a string, consuming the response.
    ///
    /// Used for reading error bodies; a read failure mid-body yields whatever
    /// was received before it.
    pub async fn text(self) -> String {
        use futures::StreamExt;

        let mut collected = Vec::new();
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => collected.extend_from_slice(&bytes),
                Err(_) => break,
            }
        }
        String::from_utf8_lossy(&collected).into_owned()
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The three-way result of a transport send.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The target produced a real HTTP response, whatever the status.
    Response(HttpResponse),
    /// The request never produced a response (connect/TLS/socket failure).
    Failure {
        /// Description of the underlying failure.
        message: String,
    },
    /// The caller cancelled while the send was in flight.
    Cancelled,
}

impl FetchOutcome {
    /// Create a failure outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Whether the fallback chain may advance to the next strategy.
    ///
    /// Only a transport failure does; a real response, even a 4xx, is the
    /// target's answer and must not be second-guessed by another route.
    #[must_use]
    pub const fn allows_fallback(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Convert a terminal outcome into the matching error.
    ///
    /// `Response` is not convertible here; status classification belongs to
    /// the caller that owns the provider name and body.
    #[must_use]
    pub fn into_error(self, provider: &str) -> MuxError {
        match self {
            Self::Failure { message } => MuxError::transport(provider, message),
            Self::Cancelled => MuxError::Cancelled,
            Self::Response(response) => MuxError::internal(format!(
                "response with status {} classified as terminal outcome",
                response.status
            )),
        }
    }
}
