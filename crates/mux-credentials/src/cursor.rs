//! Rotation cursors.
//!
//! One counter per pool key, process-wide, reset only when the process
//! restarts. Rotation spreads load across credentials; it does not promise
//! fairness across restarts, so nothing is persisted.

use dashmap::DashMap;

/// Storage for rotation positions.
///
/// The orchestrator reads the position once at the start of a call and
/// advances it on each retryable failure. Implementations must be safe to
/// share across tasks; they do not need to coordinate concurrent calls for
/// the same key (the adapter never issues two at once).
pub trait CursorStore: Send + Sync {
    /// Current raw position for a pool key. New keys start at zero.
    fn position(&self, key: &str) -> usize;

    /// Advance the position for a pool key by one.
    fn advance(&self, key: &str);
}

/// The default process-wide cursor map.
#[derive(Debug, Default)]
pub struct InMemoryCursors {
    positions: DashMap<String, usize>,
}

impl InMemoryCursors {
    /// Create an empty cursor map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position for a key directly. Intended for tests that need a
    /// deterministic starting index.
    pub fn set_position(&self, key: &str, position: usize) {
        self.positions.insert(key.to_string(), position);
    }
}

impl CursorStore for InMemoryCursors {
    fn position(&self, key: &str) -> usize {
        self.positions.get(key).map_or(0, |v| *v)
    }

    fn advance(&self, key: &str) {
        *self.positions.entry(key.to_string()).or_insert(0) += 1;
    }
}
