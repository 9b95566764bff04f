//! The rotation orchestrator.
//!
//! One call, at most pool-size attempts, never the same credential twice.
//! Only genuinely transient failures rotate: HTTP 429, HTTP 529, or a
//! transport failure that produced no response. Everything else returns
//! immediately, since a malformed request or a revoked key looks the same
//! from every credential in the pool.

use crate::cursor::CursorStore;
use crate::pool::CredentialPool;
use mux_core::{MuxError, MuxResult};
use secrecy::SecretString;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Run `attempt_fn` against the pool, rotating on retryable failure.
///
/// The starting index is the cursor's current position modulo the pool size;
/// attempt `i` uses position `start + i`, so a full sweep visits each
/// credential exactly once. The cursor advances once per retryable failure
/// and is left unchanged by success, keeping the next call on the last
/// credential that worked.
///
/// # Errors
/// - [`MuxError::Configuration`] if the pool is empty.
/// - [`MuxError::Cancelled`] if `cancel` fires between attempts.
/// - The first terminal failure, or the last retryable failure once the
///   pool is exhausted.
pub async fn with_rotation<T, F, Fut>(
    pool_key: &str,
    pool: &CredentialPool,
    cursors: &dyn CursorStore,
    cancel: &CancellationToken,
    mut attempt_fn: F,
) -> MuxResult<T>
where
    F: FnMut(SecretString) -> Fut,
    Fut: Future<Output = MuxResult<T>>,
{
    if pool.is_empty() {
        return Err(MuxError::configuration(format!(
            "no credential configured under `{pool_key}`"
        )));
    }

    let start = cursors.position(pool_key);
    let mut last_error: Option<MuxError> = None;

    for attempt in 0..pool.len() {
        if cancel.is_cancelled() {
            return Err(MuxError::Cancelled);
        }

        let Some(credential) = pool.pick(start + attempt) else {
            break;
        };

        match attempt_fn(credential.clone()).await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(pool_key, attempt = attempt + 1, "rotation succeeded");
                }
                return Ok(value);
            }
            Err(error) if error.is_retryable() => {
                cursors.advance(pool_key);
                warn!(
                    pool_key,
                    attempt = attempt + 1,
                    pool_size = pool.len(),
                    error = %error,
                    "credential attempt failed, rotating"
                );
                last_error = Some(error);
            }
            Err(error) => return Err(error),
        }
    }

    Err(last_error
        .unwrap_or_else(|| MuxError::internal("rotation exhausted without an error to report")))
}
