//! Transport strategies and route policies.
//!
//! The calling environment cannot assume direct network reach to every
//! provider, so a send walks an ordered chain of strategies: direct with the
//! tuned primary client, then through a configured relay, then a last-resort
//! attempt with a pristine default client. A strategy hop happens only when
//! the previous strategy produced no HTTP response at all; a real 4xx/5xx is
//! the target's answer and ends the chain.

use url::Url;

/// One way of getting a request onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Direct send with the tuned primary client.
    Direct,
    /// Send through the configured relay base URL.
    Relay,
    /// Direct send with an untuned default client.
    LastResort,
}

impl Strategy {
    /// Short label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Relay => "relay",
            Self::LastResort => "last-resort",
        }
    }
}

/// Which strategies an endpoint may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePolicy {
    /// Try direct first, fall back through the chain.
    #[default]
    Auto,
    /// Endpoint is documented as unreachable directly; start at the relay.
    RelayOnly,
}

impl RoutePolicy {
    /// Strategy order for this policy.
    ///
    /// Relay hops appear only when a relay is configured; a relay-only policy
    /// with no relay yields an empty chain, which callers must treat as a
    /// configuration error before attempting any send.
    #[must_use]
    pub const fn chain(self, relay_configured: bool) -> &'static [Strategy] {
        match (self, relay_configured) {
            (Self::Auto, true) => &[Strategy::Direct, Strategy::Relay, Strategy::LastResort],
            (Self::Auto, false) => &[Strategy::Direct, Strategy::LastResort],
            (Self::RelayOnly, true) => &[Strategy::Relay, Strategy::LastResort],
            (Self::RelayOnly, false) => &[],
        }
    }
}

/// Build the relay form of a target URL.
///
/// The relay convention is the target URL appended verbatim to the relay's
/// path, e.g. `https://relay.host/https://api.example.com/v1/chat?alt=sse`.
/// The target keeps its query string; the relay strips its own trailing
/// slash first so exactly one separator joins the two.
#[must_use]
pub fn relay_url(relay_base: &Url, target: &Url) -> Url {
    let joined = format!(
        "{}/{}",
        relay_base.as_str().trim_end_matches('/'),
        target.as_str()
    );
    // The two inputs are already valid URLs; their concatenation parses as
    // the relay's origin with an extended path.
    Url::parse(&joined).unwrap_or_else(|_| relay_base.clone())
}
