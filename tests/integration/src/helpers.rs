//! Shared helpers for the integration suites.

use mux_credentials::{MemoryStore, SettingsStore};
use mux_providers::Mux;
use mux_transport::TransportConfig;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Initialize tracing once per process, and only when `TEST_LOG` is set.
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for a test.
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Build an adapter over a fresh in-memory store seeded with `settings`.
pub async fn mux_with(settings: &[(&str, &str)]) -> Mux {
    init_tracing();
    Mux::new(seeded_store(settings).await).expect("adapter construction")
}

/// Build an adapter whose transport routes relay hops through `relay`.
pub async fn mux_with_relay(settings: &[(&str, &str)], relay: &str) -> Mux {
    init_tracing();
    let config = TransportConfig {
        relay_base: Some(Url::parse(relay).expect("relay url")),
        timeout: None,
    };
    Mux::with_transport(seeded_store(settings).await, config).expect("adapter construction")
}

async fn seeded_store(settings: &[(&str, &str)]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (key, value) in settings {
        store.set(key, value).await.expect("seed setting");
    }
    store
}
