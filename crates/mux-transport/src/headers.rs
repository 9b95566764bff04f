//! Header hygiene.
//!
//! Header construction rejects values outside the Latin-1 range, and
//! credentials pasted into settings fields routinely carry zero-width or
//! control characters. Every value is reduced to printable ASCII right before
//! the send, so a corrupted credential degrades to its clean substring
//! instead of failing the whole request.

use mux_core::printable_ascii;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// Build a [`HeaderMap`] from name/value pairs, scrubbing every value.
///
/// Pairs with an invalid header name, or whose value scrubs down to nothing,
/// are dropped with a debug log rather than failing the request.
#[must_use]
pub fn sanitized_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            debug!(name, "dropping header with invalid name");
            continue;
        };
        let scrubbed = printable_ascii(value);
        if scrubbed.is_empty() {
            debug!(name, "dropping header whose value scrubbed to nothing");
            continue;
        }
        match HeaderValue::from_str(&scrubbed) {
            Ok(header_value) => {
                map.insert(header_name, header_value);
            }
            Err(_) => debug!(name, "dropping header with unusable value"),
        }
    }
    map
}
