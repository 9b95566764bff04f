//! # Mux Transport
//!
//! The HTTP sending layer for llm-mux: request envelopes, header hygiene,
//! and the strategy fallback chain.
//!
//! A send resolves to a [`FetchOutcome`]: a real HTTP response (any status),
//! a transport failure, or a cancellation. The chain advances to the next
//! strategy only on a transport failure; a real response, even an error
//! status, is the target's answer and is returned as-is for the rotation
//! orchestrator to classify.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod headers;
pub mod strategy;

pub use envelope::RequestEnvelope;
pub use headers::sanitized_headers;
pub use strategy::{relay_url, RoutePolicy, Strategy};

use futures::{StreamExt, TryStreamExt};
use mux_core::{FetchOutcome, HttpResponse, MuxError, MuxResult};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Transport construction options.
///
/// No timeout is applied unless one is set here; a non-responding send is
/// the caller's concern and is usually handled by cancelling the token.
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Relay base URL for the relay strategy. Without one, relay hops are
    /// skipped and relay-only routes cannot be served.
    pub relay_base: Option<Url>,
    /// Optional whole-request timeout for the primary client.
    pub timeout: Option<Duration>,
}

/// The strategy-chain HTTP sender.
#[derive(Debug, Clone)]
pub struct Transport {
    primary: Client,
    pristine: Client,
    relay_base: Option<Url>,
}

impl Transport {
    /// Build a transport from the given options.
    ///
    /// # Errors
    /// Returns [`MuxError::Internal`] if an HTTP client cannot be constructed.
    pub fn new(config: TransportConfig) -> MuxResult<Self> {
        let mut builder = Client::builder().pool_max_idle_per_host(100);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let primary = builder
            .build()
            .map_err(|e| MuxError::internal(format!("failed to build HTTP client: {e}")))?;

        // Deliberately untuned; the last resort mirrors a plain default fetch.
        let pristine = Client::builder()
            .build()
            .map_err(|e| MuxError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            primary,
            pristine,
            relay_base: config.relay_base,
        })
    }

    /// The configured relay base, if any.
    #[must_use]
    pub fn relay_base(&self) -> Option<&Url> {
        self.relay_base.as_ref()
    }

    /// Send an envelope, walking the strategy chain for the given policy.
    ///
    /// Returns the first real HTTP response, or the last transport failure
    /// once the chain is exhausted, or `Cancelled` as soon as the token
    /// fires.
    pub async fn fetch(
        &self,
        envelope: &RequestEnvelope,
        policy: RoutePolicy,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let chain = policy.chain(self.relay_base.is_some());
        if chain.is_empty() {
            return FetchOutcome::failure("relay-only route with no relay configured");
        }

        let mut last_failure: Option<String> = None;
        for (hop, strategy) in chain.iter().enumerate() {
            if cancel.is_cancelled() {
                return FetchOutcome::Cancelled;
            }
            if hop > 0 {
                warn!(
                    strategy = strategy.label(),
                    url = %envelope.url,
                    "previous transport strategy failed, falling back"
                );
            }

            match self.send_once(*strategy, envelope, cancel).await {
                FetchOutcome::Failure { message } => {
                    debug!(
                        strategy = strategy.label(),
                        error = %message,
                        "transport strategy produced no response"
                    );
                    last_failure = Some(message);
                }
                outcome => return outcome,
            }
        }

        FetchOutcome::Failure {
            message: last_failure
                .unwrap_or_else(|| "transport chain exhausted without a response".to_string()),
        }
    }

    async fn send_once(
        &self,
        strategy: Strategy,
        envelope: &RequestEnvelope,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let (client, url) = match strategy {
            Strategy::Direct => (&self.primary, envelope.url.clone()),
            Strategy::Relay => {
                let Some(base) = &self.relay_base else {
                    return FetchOutcome::failure("relay strategy selected without a relay base");
                };
                (&self.primary, relay_url(base, &envelope.url))
            }
            Strategy::LastResort => (&self.pristine, envelope.url.clone()),
        };

        let request = client
            .post(url)
            .headers(sanitized_headers(&envelope.headers))
            .body(envelope.body.clone());

        tokio::select! {
            () = cancel.cancelled() => FetchOutcome::Cancelled,
            result = request.send() => match result {
                Ok(response) => FetchOutcome::Response(Self::into_response(response, cancel)),
                Err(error) => FetchOutcome::failure(error.to_string()),
            },
        }
    }

    /// Convert a reqwest response into the owned outcome shape.
    ///
    /// The body stream is cut short the moment the cancel token fires, which
    /// drops the connection rather than leaving a half-read stream dangling.
    fn into_response(response: reqwest::Response, cancel: &CancellationToken) -> HttpResponse {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes_stream()
            .map_err(|e| MuxError::stream(format!("body read failed: {e}")))
            .take_until(cancel.clone().cancelled_owned());

        HttpResponse {
            status,
            headers,
            body: Box::pin(body),
        }
    }
}
