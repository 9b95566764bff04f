//! The unified adapter facade.
//!
//! [`Mux`] ties the pipeline together: settings are read fresh per call,
//! the request body is formatted once, and each rotation attempt assembles
//! its own envelope (auth material differs between credentials) before
//! handing the wire bytes to the profile's decoder.

use crate::auth::{self, AwsCredential};
use crate::format::{format_body, GenerationConfig};
use crate::profile::{
    AuthScheme, ProviderKind, ProviderProfile, WireFormat, DEFAULT_VERTEX_LOCATION,
    VERTEX_LOCATION_SETTING,
};
use bytes::Bytes;
use mux_core::{printable_ascii, ChatTurn, FetchOutcome, HostReport, HttpResponse, MuxError, MuxResult};
use mux_credentials::{
    with_rotation, CredentialPool, CursorStore, InMemoryCursors, SettingsStore, TokenBroker,
};
use mux_streaming::{
    decode_anthropic, decode_event_stream, decode_sse, CompletionStream, DeltaPath,
};
use mux_transport::{RequestEnvelope, Transport, TransportConfig};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// The streaming completion adapter.
///
/// One instance serves every provider; per-provider state is limited to
/// rotation cursors and cached derived tokens, both keyed by setting name
/// or account and held inside the instance.
pub struct Mux {
    store: Arc<dyn SettingsStore>,
    transport: Transport,
    cursors: Arc<dyn CursorStore>,
    broker: TokenBroker,
}

impl Mux {
    /// Build an adapter over the given settings store with default
    /// transport options.
    ///
    /// # Errors
    /// Returns [`MuxError::Internal`] if the HTTP clients cannot be built.
    pub fn new(store: Arc<dyn SettingsStore>) -> MuxResult<Self> {
        Self::with_transport(store, TransportConfig::default())
    }

    /// Build an adapter with explicit transport options (relay base,
    /// timeout).
    ///
    /// # Errors
    /// Returns [`MuxError::Internal`] if the HTTP clients cannot be built.
    pub fn with_transport(store: Arc<dyn SettingsStore>, config: TransportConfig) -> MuxResult<Self> {
        Ok(Self {
            store,
            transport: Transport::new(config)?,
            cursors: Arc::new(InMemoryCursors::new()),
            broker: TokenBroker::new(),
        })
    }

    /// Replace the rotation cursor store, e.g. to share cursors across
    /// adapter instances.
    #[must_use]
    pub fn with_cursors(mut self, cursors: Arc<dyn CursorStore>) -> Self {
        self.cursors = cursors;
        self
    }

    /// Stream a completion from the given provider.
    ///
    /// Resolves once a credential attempt produces a 2xx response; the
    /// returned stream then carries that response's decoded events. Rotation
    /// happens before this resolves, so a stream, once obtained, belongs to
    /// exactly one credential.
    ///
    /// # Errors
    /// - [`MuxError::Configuration`] for a blank model, empty turn list,
    ///   missing credential, or malformed override URL.
    /// - [`MuxError::Provider`] with the final status once rotation ends on
    ///   an HTTP error.
    /// - [`MuxError::Transport`] when no route produced a response.
    /// - [`MuxError::Cancelled`] when the token fires before headers arrive.
    pub async fn stream_chat(
        &self,
        kind: ProviderKind,
        turns: &[ChatTurn],
        config: &GenerationConfig,
        cancel: &CancellationToken,
    ) -> MuxResult<CompletionStream> {
        let profile = kind.profile();
        let body = format_body(profile, turns, config)?;
        let body = Bytes::from(serde_json::to_vec(&body)?);
        let model = config.model.trim();

        let raw = self
            .store
            .get(profile.credential_setting)
            .await?
            .unwrap_or_default();
        let pool = CredentialPool::from_raw(&raw, profile.separator);
        let base_override = self.base_override(profile).await?;
        let location = self.vertex_location(profile).await?;

        debug!(
            provider = %profile.kind,
            model,
            pool_size = pool.len(),
            "starting streaming completion"
        );

        let response = with_rotation(
            profile.credential_setting,
            &pool,
            self.cursors.as_ref(),
            cancel,
            |credential| {
                let body = body.clone();
                let base_override = base_override.clone();
                let location = location.clone();
                async move {
                    let envelope = self
                        .build_envelope(
                            profile,
                            model,
                            &credential,
                            body,
                            base_override.as_deref(),
                            &location,
                        )
                        .await?;
                    let outcome = self.transport.fetch(&envelope, profile.route, cancel).await;
                    self.classify(profile, outcome, &credential).await
                }
            },
        )
        .await?;

        let body = response.body;
        Ok(match profile.wire {
            WireFormat::OpenAiSse => decode_sse(body, DeltaPath::OpenAiChat, cancel.clone()),
            WireFormat::GeminiSse => decode_sse(body, DeltaPath::GeminiCandidates, cancel.clone()),
            WireFormat::AnthropicSse => decode_anthropic(body, cancel.clone()),
            WireFormat::AwsEventStream => decode_event_stream(body, cancel.clone()),
        })
    }

    /// Run a completion to the end and return the full text.
    ///
    /// # Errors
    /// As [`Mux::stream_chat`], plus [`MuxError::Stream`] when the stream
    /// carries an error event.
    pub async fn chat(
        &self,
        kind: ProviderKind,
        turns: &[ChatTurn],
        config: &GenerationConfig,
        cancel: &CancellationToken,
    ) -> MuxResult<String> {
        let stream = self.stream_chat(kind, turns, config, cancel).await?;
        stream.collect_text().await
    }

    /// Run a completion and fold any failure into a displayable report.
    pub async fn chat_report(
        &self,
        kind: ProviderKind,
        turns: &[ChatTurn],
        config: &GenerationConfig,
        cancel: &CancellationToken,
    ) -> HostReport {
        match self.chat(kind, turns, config, cancel).await {
            Ok(content) => HostReport::ok(content),
            Err(error) => HostReport::failure(&error),
        }
    }

    /// Base-URL override from settings, scrubbed and stripped of trailing
    /// slashes. Empty or absent means the profile default applies.
    async fn base_override(&self, profile: &ProviderProfile) -> MuxResult<Option<String>> {
        let Some(raw) = self.store.get(profile.base_url_setting).await? else {
            return Ok(None);
        };
        let cleaned = printable_ascii(&raw);
        let trimmed = cleaned.trim_end_matches('/');
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    async fn vertex_location(&self, profile: &ProviderProfile) -> MuxResult<String> {
        if profile.auth != AuthScheme::ServiceAccount {
            return Ok(DEFAULT_VERTEX_LOCATION.to_string());
        }
        Ok(self
            .store
            .get(VERTEX_LOCATION_SETTING)
            .await?
            .map(|raw| printable_ascii(&raw))
            .filter(|location| !location.is_empty())
            .unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.to_string()))
    }

    /// Assemble the envelope for one attempt with one credential.
    async fn build_envelope(
        &self,
        profile: &ProviderProfile,
        model: &str,
        credential: &SecretString,
        body: Bytes,
        base_override: Option<&str>,
        location: &str,
    ) -> MuxResult<RequestEnvelope> {
        match profile.auth {
            AuthScheme::Bearer => {
                let base = base_override.unwrap_or(profile.default_base_url);
                let url = parse_endpoint(&format!("{base}/chat/completions"))?;
                Ok(auth::bearer(
                    RequestEnvelope::post(url, body).with_header("accept", "text/event-stream"),
                    credential,
                ))
            }
            AuthScheme::XApiKey => {
                let base = base_override.unwrap_or(profile.default_base_url);
                let url = parse_endpoint(&format!("{base}/v1/messages"))?;
                Ok(auth::x_api_key(
                    RequestEnvelope::post(url, body).with_header("accept", "text/event-stream"),
                    credential,
                ))
            }
            AuthScheme::QueryKey => {
                let base = base_override.unwrap_or(profile.default_base_url);
                let url = parse_endpoint(&format!(
                    "{base}/v1beta/models/{model}:streamGenerateContent?alt=sse"
                ))?;
                Ok(auth::query_key(RequestEnvelope::post(url, body), credential))
            }
            AuthScheme::ServiceAccount => {
                let key = TokenBroker::parse_key(credential.expose_secret())?;
                let project = key.project_id.as_deref().ok_or_else(|| {
                    MuxError::configuration("service-account blob has no project_id")
                })?;
                let default_base = format!("https://{location}-aiplatform.googleapis.com");
                let base = base_override.unwrap_or(&default_base);
                let url = parse_endpoint(&format!(
                    "{base}/v1/projects/{project}/locations/{location}\
                     /publishers/google/models/{model}:streamGenerateContent?alt=sse"
                ))?;
                auth::service_account(RequestEnvelope::post(url, body), &key, &self.broker).await
            }
            AuthScheme::SigV4 => {
                let aws = AwsCredential::parse(credential)?;
                let default_base =
                    format!("https://bedrock-runtime.{}.amazonaws.com", aws.region);
                let base = base_override.unwrap_or(&default_base);
                let url = parse_endpoint(&format!(
                    "{base}/model/{model}/invoke-with-response-stream"
                ))?;
                auth::sigv4(
                    RequestEnvelope::post(url, body)
                        .with_header("accept", "application/vnd.amazon.eventstream"),
                    &aws,
                )
            }
        }
    }

    /// Turn a fetch outcome into either a success response or the error the
    /// rotation orchestrator classifies.
    async fn classify(
        &self,
        profile: &ProviderProfile,
        outcome: FetchOutcome,
        credential: &SecretString,
    ) -> MuxResult<HttpResponse> {
        match outcome {
            FetchOutcome::Response(response) if response.is_success() => Ok(response),
            FetchOutcome::Response(response) => {
                let status = response.status;
                let text = response.text().await;
                let error = MuxError::provider(profile.display_name, status, &text);
                if error.invalidates_token() && profile.auth == AuthScheme::ServiceAccount {
                    if let Ok(key) = TokenBroker::parse_key(credential.expose_secret()) {
                        self.broker.invalidate(&key.client_email);
                    }
                }
                Err(error)
            }
            other => Err(other.into_error(profile.display_name)),
        }
    }
}

impl std::fmt::Debug for Mux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mux")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

fn parse_endpoint(raw: &str) -> MuxResult<Url> {
    Url::parse(raw).map_err(|e| MuxError::configuration(format!("bad endpoint URL `{raw}`: {e}")))
}
