//! Host settings store abstraction.
//!
//! Credentials and base-URL overrides live in a key-value store the host
//! application provides, one string value per key. The store is re-read on
//! every call rather than cached, so settings changes take effect on the
//! next completion.

use crate::pool::{CredentialPool, Separator};
use async_trait::async_trait;
use dashmap::DashMap;
use mux_core::{MuxError, MuxResult};

/// A host-provided key-value settings store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> MuxResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> MuxResult<()>;
}

/// In-memory settings store for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> MuxResult<Option<String>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> MuxResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Sanitize and persist a raw credential value.
///
/// The value is parsed with the provider's separator, each entry scrubbed to
/// printable ASCII, and the surviving entries re-joined one per line before
/// the write. Persisting through this path means a value corrupted by
/// invisible characters heals on its next save.
///
/// # Errors
/// Returns [`MuxError::Configuration`] if no usable entries survive the
/// scrub, or the store write error.
pub async fn store_credential(
    store: &dyn SettingsStore,
    key: &str,
    raw: &str,
    separator: Separator,
) -> MuxResult<()> {
    let pool = CredentialPool::from_raw(raw, separator);
    if pool.is_empty() {
        return Err(MuxError::configuration(format!(
            "no usable credential entries in value for `{key}`"
        )));
    }
    store.set(key, &pool.rejoined()).await
}
