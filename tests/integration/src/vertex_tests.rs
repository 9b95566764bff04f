//! Vertex AI: service-account token minting, caching, invalidation, and
//! rotation across accounts.

use crate::fixtures::{
    service_account_blob, service_account_blob_for, service_account_blob_without_project,
    TEST_PROJECT_ID,
};
use crate::helpers::*;
use crate::mock_providers::MockVertex;
use mux_core::{ChatTurn, MuxError, MuxResult};
use mux_providers::{GenerationConfig, Mux, ProviderKind};
use tokio_util::sync::CancellationToken;

const MODEL: &str = "gemini-2.0-flash";

async fn run_chat(mux: &Mux) -> MuxResult<String> {
    mux.chat(
        ProviderKind::Vertex,
        &[ChatTurn::user("hello")],
        &GenerationConfig::new(MODEL),
        &CancellationToken::new(),
    )
    .await
}

async fn generate_requests(mock: &MockVertex) -> Vec<wiremock::Request> {
    mock.requests()
        .await
        .into_iter()
        .filter(|request| request.url.path().ends_with(":streamGenerateContent"))
        .collect()
}

fn header_of<'a>(request: &'a wiremock::Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_streams_with_minted_token() {
    let mock = MockVertex::start().await;
    mock.mock_token("tok-live").await;
    mock.mock_generate(TEST_PROJECT_ID, MODEL, &["Hi", " from Vertex"]).await;
    let blob = service_account_blob(&mock.token_uri());
    let mux = mux_with(&[
        ("vertex.service_account", blob.as_str()),
        ("vertex.base_url", &mock.url()),
    ])
    .await;

    let text = run_chat(&mux).await.expect("completion");
    assert_eq!(text, "Hi from Vertex");

    let token_hits = mock.token_requests().await;
    assert_eq!(token_hits.len(), 1);
    let form = String::from_utf8_lossy(&token_hits[0].body).into_owned();
    assert!(form.contains("grant_type="), "form: {form}");
    assert!(form.contains("assertion="), "form: {form}");

    let generates = generate_requests(&mock).await;
    assert_eq!(generates.len(), 1);
    assert_eq!(header_of(&generates[0], "authorization"), "Bearer tok-live");
    assert_eq!(generates[0].url.query(), Some("alt=sse"));
}

#[tokio::test]
async fn test_token_cached_across_calls() {
    let mock = MockVertex::start().await;
    mock.mock_token("tok-cached").await;
    mock.mock_generate(TEST_PROJECT_ID, MODEL, &["ok"]).await;
    let blob = service_account_blob(&mock.token_uri());
    let mux = mux_with(&[
        ("vertex.service_account", blob.as_str()),
        ("vertex.base_url", &mock.url()),
    ])
    .await;

    for _ in 0..2 {
        run_chat(&mux).await.expect("completion");
    }

    assert_eq!(mock.token_requests().await.len(), 1);
    assert_eq!(generate_requests(&mock).await.len(), 2);
}

#[tokio::test]
async fn test_auth_rejection_invalidates_cached_token() {
    let mock = MockVertex::start().await;
    mock.mock_token("tok-rotating").await;
    // First generate call is rejected, the retry after re-mint succeeds.
    mock.mock_generate_status(TEST_PROJECT_ID, MODEL, 401, 1).await;
    mock.mock_generate(TEST_PROJECT_ID, MODEL, &["recovered"]).await;
    let blob = service_account_blob(&mock.token_uri());
    let mux = mux_with(&[
        ("vertex.service_account", blob.as_str()),
        ("vertex.base_url", &mock.url()),
    ])
    .await;

    let error = run_chat(&mux).await.expect_err("rejected call");
    assert_eq!(error.status(), Some(401));

    let text = run_chat(&mux).await.expect("second call");
    assert_eq!(text, "recovered");
    // The 401 discarded the cached token, so the second call minted anew.
    assert_eq!(mock.token_requests().await.len(), 2);
}

#[tokio::test]
async fn test_blob_without_project_is_configuration_error() {
    let mock = MockVertex::start().await;
    let blob = service_account_blob_without_project(&mock.token_uri());
    let mux = mux_with(&[
        ("vertex.service_account", blob.as_str()),
        ("vertex.base_url", &mock.url()),
    ])
    .await;

    let error = run_chat(&mux).await.expect_err("unusable blob");
    assert!(matches!(error, MuxError::Configuration { .. }), "{error:?}");
    assert!(error.to_string().contains("project_id"), "{error}");
    assert!(mock.requests().await.is_empty());
}

#[tokio::test]
async fn test_rotation_across_service_accounts() {
    let mock = MockVertex::start().await;
    mock.mock_token("tok-pool").await;
    mock.mock_generate_status(TEST_PROJECT_ID, MODEL, 429, 1).await;
    mock.mock_generate(TEST_PROJECT_ID, MODEL, &["second account"]).await;
    let first = service_account_blob_for("first@proj-demo.iam.gserviceaccount.com", &mock.token_uri());
    let second = service_account_blob_for("second@proj-demo.iam.gserviceaccount.com", &mock.token_uri());
    let pool = format!("{first}\n{second}");
    let mux = mux_with(&[
        ("vertex.service_account", pool.as_str()),
        ("vertex.base_url", &mock.url()),
    ])
    .await;

    let text = run_chat(&mux).await.expect("rotated completion");
    assert_eq!(text, "second account");
    // Each account minted its own token on its attempt.
    assert_eq!(mock.token_requests().await.len(), 2);
    assert_eq!(generate_requests(&mock).await.len(), 2);
}
