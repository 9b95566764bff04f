//! Static provider profiles.
//!
//! A profile is everything fixed about a provider: where it lives, which
//! settings-store slots hold its credential and base-URL override, how its
//! credential string splits into a pool, how its request body is shaped,
//! which decoder reads its stream, and how requests are authenticated.
//! Profiles are compile-time constants; per-call material (credentials,
//! overrides, models) comes from the settings store and the caller.

use mux_credentials::Separator;
use mux_transport::RoutePolicy;
use serde::{Deserialize, Serialize};

/// Settings-store slot for the Vertex location, e.g. `us-central1`.
pub const VERTEX_LOCATION_SETTING: &str = "vertex.location";
/// Location used when the slot is unset.
pub const DEFAULT_VERTEX_LOCATION: &str = "us-central1";
/// Region used when a Bedrock credential omits its region part.
pub const DEFAULT_BEDROCK_REGION: &str = "us-east-1";

/// The providers the adapter can speak to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions.
    OpenAi,
    /// DeepSeek's OpenAI-compatible endpoint.
    DeepSeek,
    /// OpenRouter's OpenAI-compatible aggregator.
    OpenRouter,
    /// Anthropic messages API.
    Anthropic,
    /// Google AI Studio (Gemini API key) endpoint.
    Gemini,
    /// Google Cloud Vertex AI with service-account credentials.
    Vertex,
    /// AWS Bedrock invoke-with-response-stream.
    Bedrock,
}

impl ProviderKind {
    /// Every supported provider, in display order.
    pub const ALL: [Self; 7] = [
        Self::OpenAi,
        Self::DeepSeek,
        Self::OpenRouter,
        Self::Anthropic,
        Self::Gemini,
        Self::Vertex,
        Self::Bedrock,
    ];

    /// The static profile for this provider.
    #[must_use]
    pub const fn profile(self) -> &'static ProviderProfile {
        match self {
            Self::OpenAi => &OPENAI,
            Self::DeepSeek => &DEEPSEEK,
            Self::OpenRouter => &OPENROUTER,
            Self::Anthropic => &ANTHROPIC,
            Self::Gemini => &GEMINI,
            Self::Vertex => &VERTEX,
            Self::Bedrock => &BEDROCK,
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        self.profile().display_name
    }

    /// Wire name as used in settings keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::OpenRouter => "openrouter",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Vertex => "vertex",
            Self::Bedrock => "bedrock",
        }
    }

    /// Parse a wire name back into a kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming wire formats, each served by one decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `data:` lines with `choices[0].delta.content` and a `[DONE]` sentinel.
    OpenAiSse,
    /// Anthropic tagged events (`content_block_delta`, `message_stop`, ...).
    AnthropicSse,
    /// `data:` lines with `candidates[0].content.parts[*].text`, no sentinel.
    GeminiSse,
    /// AWS binary event-stream frames.
    AwsEventStream,
}

/// How requests to a provider are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `authorization: Bearer <key>`.
    Bearer,
    /// `x-api-key` plus the `anthropic-version` header.
    XApiKey,
    /// Key appended to the URL query string.
    QueryKey,
    /// Service-account blob exchanged for a short-lived bearer token.
    ServiceAccount,
    /// AWS Signature Version 4 request signing.
    SigV4,
}

/// Everything fixed about one provider.
#[derive(Debug)]
pub struct ProviderProfile {
    /// The provider this profile describes.
    pub kind: ProviderKind,
    /// Human-readable name used in errors and reports.
    pub display_name: &'static str,
    /// Base URL used when the override slot is empty. For Vertex and
    /// Bedrock this reflects the default location/region; the live base is
    /// derived per call from the location setting or the credential.
    pub default_base_url: &'static str,
    /// Settings-store slot holding the provider's credential string.
    pub credential_setting: &'static str,
    /// Settings-store slot holding the base-URL override.
    pub base_url_setting: &'static str,
    /// How the credential string splits into a pool.
    pub separator: Separator,
    /// Whether system turns move to a separate top-level field.
    pub system_field_separate: bool,
    /// Which decoder reads this provider's stream.
    pub wire: WireFormat,
    /// Which transport strategies the endpoint may use.
    pub route: RoutePolicy,
    /// How requests are authenticated.
    pub auth: AuthScheme,
}

const OPENAI: ProviderProfile = ProviderProfile {
    kind: ProviderKind::OpenAi,
    display_name: "OpenAI",
    default_base_url: "https://api.openai.com/v1",
    credential_setting: "openai.api_key",
    base_url_setting: "openai.base_url",
    separator: Separator::WhitespaceOrComma,
    system_field_separate: false,
    wire: WireFormat::OpenAiSse,
    route: RoutePolicy::Auto,
    auth: AuthScheme::Bearer,
};

const DEEPSEEK: ProviderProfile = ProviderProfile {
    kind: ProviderKind::DeepSeek,
    display_name: "DeepSeek",
    default_base_url: "https://api.deepseek.com",
    credential_setting: "deepseek.api_key",
    base_url_setting: "deepseek.base_url",
    separator: Separator::WhitespaceOrComma,
    system_field_separate: false,
    wire: WireFormat::OpenAiSse,
    route: RoutePolicy::Auto,
    auth: AuthScheme::Bearer,
};

const OPENROUTER: ProviderProfile = ProviderProfile {
    kind: ProviderKind::OpenRouter,
    display_name: "OpenRouter",
    default_base_url: "https://openrouter.ai/api/v1",
    credential_setting: "openrouter.api_key",
    base_url_setting: "openrouter.base_url",
    separator: Separator::WhitespaceOrComma,
    system_field_separate: false,
    wire: WireFormat::OpenAiSse,
    route: RoutePolicy::Auto,
    auth: AuthScheme::Bearer,
};

const ANTHROPIC: ProviderProfile = ProviderProfile {
    kind: ProviderKind::Anthropic,
    display_name: "Anthropic",
    default_base_url: "https://api.anthropic.com",
    credential_setting: "anthropic.api_key",
    base_url_setting: "anthropic.base_url",
    separator: Separator::Whitespace,
    system_field_separate: true,
    wire: WireFormat::AnthropicSse,
    route: RoutePolicy::Auto,
    auth: AuthScheme::XApiKey,
};

const GEMINI: ProviderProfile = ProviderProfile {
    kind: ProviderKind::Gemini,
    display_name: "Gemini",
    default_base_url: "https://generativelanguage.googleapis.com",
    credential_setting: "gemini.api_key",
    base_url_setting: "gemini.base_url",
    separator: Separator::WhitespaceOrComma,
    system_field_separate: true,
    wire: WireFormat::GeminiSse,
    route: RoutePolicy::Auto,
    auth: AuthScheme::QueryKey,
};

const VERTEX: ProviderProfile = ProviderProfile {
    kind: ProviderKind::Vertex,
    display_name: "Vertex AI",
    default_base_url: "https://us-central1-aiplatform.googleapis.com",
    credential_setting: "vertex.service_account",
    base_url_setting: "vertex.base_url",
    separator: Separator::Lines,
    system_field_separate: true,
    wire: WireFormat::GeminiSse,
    route: RoutePolicy::Auto,
    auth: AuthScheme::ServiceAccount,
};

const BEDROCK: ProviderProfile = ProviderProfile {
    kind: ProviderKind::Bedrock,
    display_name: "AWS Bedrock",
    default_base_url: "https://bedrock-runtime.us-east-1.amazonaws.com",
    credential_setting: "bedrock.credentials",
    base_url_setting: "bedrock.base_url",
    separator: Separator::Whitespace,
    system_field_separate: true,
    wire: WireFormat::AwsEventStream,
    // The runtime endpoint rejects direct calls from the host context the
    // original adapter ran in, so the chain starts at the relay.
    route: RoutePolicy::RelayOnly,
    auth: AuthScheme::SigV4,
};
