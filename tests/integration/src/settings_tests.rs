//! Settings-store integration: credential persistence hygiene and store
//! failures surfacing through the adapter.

use crate::helpers::*;
use crate::mock_providers::MockOpenAi;
use async_trait::async_trait;
use mux_core::{ChatTurn, MuxError, MuxResult};
use mux_credentials::{store_credential, MemoryStore, Separator, SettingsStore};
use mux_providers::{GenerationConfig, Mux, ProviderKind};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

async fn run_chat(mux: &Mux) -> MuxResult<String> {
    mux.chat(
        ProviderKind::OpenAi,
        &[ChatTurn::user("hello")],
        &GenerationConfig::new("gpt-4o"),
        &CancellationToken::new(),
    )
    .await
}

/// A credential persisted through `store_credential` is scrubbed on save and
/// usable as-is on the next completion.
#[tokio::test]
async fn test_stored_credential_drives_the_pool() {
    init_tracing();
    let mock = MockOpenAi::start().await;
    mock.mock_completion_for_key("sk-clean", &["ok"]).await;

    let store = Arc::new(MemoryStore::new());
    store_credential(
        store.as_ref(),
        "openai.api_key",
        "  sk-\u{200b}clean  ",
        Separator::WhitespaceOrComma,
    )
    .await
    .expect("persist credential");
    store
        .set("openai.base_url", &mock.url())
        .await
        .expect("persist base url");

    let mux = Mux::new(store).expect("adapter");
    let text = run_chat(&mux).await.expect("completion");
    assert_eq!(text, "ok");
}

/// Re-persisting an already-stored value is a fixed point.
#[tokio::test]
async fn test_persisted_value_is_canonical() {
    let store = MemoryStore::new();
    store_credential(
        &store,
        "openai.api_key",
        " sk-a1,sk-b2 ",
        Separator::WhitespaceOrComma,
    )
    .await
    .expect("first save");
    let first = store
        .get("openai.api_key")
        .await
        .expect("get")
        .expect("value");
    assert_eq!(first, "sk-a1\nsk-b2");

    store_credential(&store, "openai.api_key", &first, Separator::WhitespaceOrComma)
        .await
        .expect("second save");
    let second = store
        .get("openai.api_key")
        .await
        .expect("get")
        .expect("value");
    assert_eq!(second, first);
}

/// A value that scrubs down to nothing is rejected without touching the
/// stored state.
#[tokio::test]
async fn test_unusable_credential_value_is_rejected() {
    let store = MemoryStore::new();
    let result = store_credential(
        &store,
        "anthropic.api_key",
        " \u{feff}\u{200b} ",
        Separator::Whitespace,
    )
    .await;
    assert!(matches!(result, Err(MuxError::Configuration { .. })));
    assert_eq!(store.get("anthropic.api_key").await.expect("get"), None);
}

/// Invisible characters and stray slashes in a base-URL override are
/// tolerated.
#[tokio::test]
async fn test_base_url_override_is_scrubbed() {
    let mock = MockOpenAi::start().await;
    mock.mock_completion(&["ok"]).await;
    let messy = format!(" {}\u{200b}/ ", mock.url());
    let mux = mux_with(&[
        ("openai.api_key", "sk-test"),
        ("openai.base_url", messy.as_str()),
    ])
    .await;

    let text = run_chat(&mux).await.expect("completion");
    assert_eq!(text, "ok");
}

struct OfflineStore;

#[async_trait]
impl SettingsStore for OfflineStore {
    async fn get(&self, _key: &str) -> MuxResult<Option<String>> {
        Err(MuxError::store("settings backend offline"))
    }

    async fn set(&self, _key: &str, _value: &str) -> MuxResult<()> {
        Err(MuxError::store("settings backend offline"))
    }
}

/// A failing store read surfaces as a store error, not as a missing
/// credential.
#[tokio::test]
async fn test_store_read_error_reaches_caller() {
    init_tracing();
    let mux = Mux::new(Arc::new(OfflineStore)).expect("adapter");
    let error = run_chat(&mux).await.expect_err("store offline");
    assert!(matches!(error, MuxError::Store { .. }), "{error:?}");
}
