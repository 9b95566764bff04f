//! Credential rotation behavior observed at the adapter surface.

use crate::helpers::*;
use crate::mock_providers::*;
use mux_core::{ChatTurn, MuxError, MuxResult};
use mux_providers::{GenerationConfig, Mux, ProviderKind};
use tokio_util::sync::CancellationToken;

async fn run_chat(mux: &Mux) -> MuxResult<String> {
    mux.chat(
        ProviderKind::OpenAi,
        &[ChatTurn::user("ping")],
        &GenerationConfig::new("gpt-4o"),
        &CancellationToken::new(),
    )
    .await
}

fn bearer_tokens(requests: &[wiremock::Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|request| request.headers.get("authorization"))
        .filter_map(|value| value.to_str().ok())
        .map(str::to_owned)
        .collect()
}

/// A full sweep tries each credential exactly once, in order, and returns
/// the last rate-limit error once the pool is exhausted.
#[tokio::test]
async fn test_exhausted_pool_visits_each_key_once() {
    let mock = MockOpenAi::start().await;
    mock.mock_status(429).await;
    let mux = mux_with(&[
        ("openai.api_key", "k1 k2 k3"),
        ("openai.base_url", &mock.url()),
    ])
    .await;

    let err = run_chat(&mux).await.expect_err("pool exhausted");
    assert_eq!(err.status(), Some(429));
    assert!(err.is_retryable());

    let tokens = bearer_tokens(&mock.requests().await);
    assert_eq!(tokens, ["Bearer k1", "Bearer k2", "Bearer k3"]);
}

/// HTTP 529 rotates exactly like 429.
#[tokio::test]
async fn test_overloaded_key_is_skipped() {
    let mock = MockOpenAi::start().await;
    mock.mock_status_for_key("k1", 529).await;
    mock.mock_completion_for_key("k2", &["ok"]).await;
    let mux = mux_with(&[
        ("openai.api_key", "k1, k2"),
        ("openai.base_url", &mock.url()),
    ])
    .await;

    assert_eq!(run_chat(&mux).await.expect("second key"), "ok");
    assert_eq!(mock.requests().await.len(), 2);
}

/// Terminal statuses end the call on the first attempt; rotating cannot
/// fix a malformed request or a revoked key.
#[tokio::test]
async fn test_terminal_statuses_stop_after_one_attempt() {
    for status in [400, 401, 403, 404, 500] {
        let mock = MockOpenAi::start().await;
        mock.mock_status(status).await;
        let mux = mux_with(&[
            ("openai.api_key", "k1 k2 k3"),
            ("openai.base_url", &mock.url()),
        ])
        .await;

        let err = run_chat(&mux).await.expect_err("terminal status");
        assert_eq!(err.status(), Some(status));
        assert!(!err.is_retryable(), "status {status}");
        assert_eq!(mock.requests().await.len(), 1, "status {status}");
    }
}

/// The cursor stays on the credential that worked, so the next call starts
/// there instead of re-trying the known-bad key.
#[tokio::test]
async fn test_cursor_resumes_on_last_good_key() {
    let mock = MockOpenAi::start().await;
    mock.mock_status_for_key("k1", 429).await;
    mock.mock_completion_for_key("k2", &["ok"]).await;
    let mux = mux_with(&[
        ("openai.api_key", "k1 k2"),
        ("openai.base_url", &mock.url()),
    ])
    .await;

    assert_eq!(run_chat(&mux).await.expect("first call"), "ok");
    assert_eq!(run_chat(&mux).await.expect("second call"), "ok");

    let tokens = bearer_tokens(&mock.requests().await);
    assert_eq!(tokens, ["Bearer k1", "Bearer k2", "Bearer k2"]);
}

/// An empty pool is a configuration error naming the setting to fill in,
/// raised before anything goes on the wire.
#[tokio::test]
async fn test_missing_credential_names_the_setting() {
    let mux = mux_with(&[]).await;
    let err = mux
        .chat(
            ProviderKind::DeepSeek,
            &[ChatTurn::user("ping")],
            &GenerationConfig::new("deepseek-chat"),
            &CancellationToken::new(),
        )
        .await
        .expect_err("no credential");

    assert!(matches!(err, MuxError::Configuration { .. }));
    assert!(err.to_string().contains("deepseek.api_key"));
}

/// A cancel before the first attempt sends nothing.
#[tokio::test]
async fn test_cancelled_before_send() {
    let mock = MockOpenAi::start().await;
    mock.mock_completion(&["never seen"]).await;
    let mux = mux_with(&[
        ("openai.api_key", "k1"),
        ("openai.base_url", &mock.url()),
    ])
    .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = mux
        .chat(
            ProviderKind::OpenAi,
            &[ChatTurn::user("ping")],
            &GenerationConfig::new("gpt-4o"),
            &cancel,
        )
        .await
        .expect_err("cancelled");

    assert!(matches!(err, MuxError::Cancelled));
    assert!(mock.requests().await.is_empty());
}
