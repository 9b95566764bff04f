//! Bedrock invocation through the relay: SigV4 signing on the wire, model
//! family bodies, and binary event-stream decoding.

use crate::fixtures::{claude_stream_events, titan_stream_events};
use crate::helpers::*;
use crate::mock_providers::MockBedrockRelay;
use mux_core::{ChatTurn, MuxError, MuxResult};
use mux_providers::{GenerationConfig, Mux, ProviderKind};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

const CLAUDE_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

fn turns() -> Vec<ChatTurn> {
    vec![ChatTurn::user("hello")]
}

async fn run_chat(mux: &Mux, model: &str) -> MuxResult<String> {
    mux.chat(
        ProviderKind::Bedrock,
        &turns(),
        &GenerationConfig::new(model),
        &CancellationToken::new(),
    )
    .await
}

fn header_of<'a>(request: &'a wiremock::Request, name: &str) -> &'a str {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_claude_streams_through_relay() {
    let relay = MockBedrockRelay::start().await;
    relay.mock_stream(&claude_stream_events(&["Hel", "lo"])).await;
    let mux = mux_with_relay(&[("bedrock.credentials", "AKIATEST:secret")], &relay.url()).await;

    let text = run_chat(&mux, CLAUDE_MODEL).await.expect("completion");
    assert_eq!(text, "Hello");

    let requests = relay.requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    // The relay convention carries the full runtime URL in the path.
    let path = request.url.path();
    assert!(
        path.starts_with("/https://bedrock-runtime.us-east-1.amazonaws.com/model/"),
        "path: {path}"
    );
    assert!(path.contains("anthropic.claude-3-haiku-20240307-v1"), "path: {path}");
    assert!(path.ends_with("/invoke-with-response-stream"), "path: {path}");

    let authorization = header_of(request, "authorization");
    assert!(
        authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIATEST/"),
        "authorization: {authorization}"
    );
    assert!(authorization.contains("/us-east-1/bedrock/aws4_request"));
    assert!(authorization.contains("SignedHeaders="));
    assert!(authorization.contains("Signature="));
    assert!(!header_of(request, "x-amz-date").is_empty());
    assert!(!header_of(request, "x-amz-content-sha256").is_empty());
    // The signature covers the runtime host, not the relay's.
    assert_eq!(header_of(request, "host"), "bedrock-runtime.us-east-1.amazonaws.com");
    assert_eq!(header_of(request, "accept"), "application/vnd.amazon.eventstream");

    let body: Value = serde_json::from_slice(&request.body).expect("json body");
    assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
    assert_eq!(body["messages"][0]["role"], "user");
    assert!(body.get("stream").is_none());
}

#[tokio::test]
async fn test_titan_stream_decodes_output_text() {
    let relay = MockBedrockRelay::start().await;
    relay.mock_stream(&titan_stream_events(&["All ", "set"])).await;
    let mux = mux_with_relay(&[("bedrock.credentials", "AKIATEST:secret")], &relay.url()).await;

    let text = run_chat(&mux, "amazon.titan-text-express-v1")
        .await
        .expect("completion");
    assert_eq!(text, "All set");

    let body: Value =
        serde_json::from_slice(&relay.requests().await[0].body).expect("json body");
    assert_eq!(body["inputText"], "User: hello\n\nAssistant:");
    assert_eq!(body["textGenerationConfig"]["maxTokenCount"], 4096);
}

#[tokio::test]
async fn test_region_comes_from_credential() {
    let relay = MockBedrockRelay::start().await;
    relay.mock_stream(&claude_stream_events(&["ok"])).await;
    let mux = mux_with_relay(
        &[("bedrock.credentials", "AKIATEST:secret:eu-west-1")],
        &relay.url(),
    )
    .await;

    run_chat(&mux, CLAUDE_MODEL).await.expect("completion");

    let requests = relay.requests().await;
    let request = &requests[0];
    assert!(request
        .url
        .path()
        .starts_with("/https://bedrock-runtime.eu-west-1.amazonaws.com/model/"));
    assert!(header_of(request, "authorization").contains("/eu-west-1/bedrock/aws4_request"));
    assert_eq!(header_of(request, "host"), "bedrock-runtime.eu-west-1.amazonaws.com");
}

#[tokio::test]
async fn test_without_relay_there_is_no_route() {
    let mux = mux_with(&[("bedrock.credentials", "AKIATEST:secret")]).await;

    let error = run_chat(&mux, CLAUDE_MODEL).await.expect_err("no route");
    assert!(matches!(error, MuxError::Transport { .. }), "{error:?}");
    assert!(error.to_string().contains("relay"), "{error}");
}

#[tokio::test]
async fn test_unsupported_model_family_rejected_before_send() {
    let relay = MockBedrockRelay::start().await;
    relay.mock_stream(&claude_stream_events(&["ok"])).await;
    let mux = mux_with_relay(&[("bedrock.credentials", "AKIATEST:secret")], &relay.url()).await;

    let error = run_chat(&mux, "cohere.command-r-v1:0")
        .await
        .expect_err("unsupported family");
    assert!(matches!(error, MuxError::Configuration { .. }), "{error:?}");
    assert!(error.to_string().contains("unsupported Bedrock model family"));
    assert!(relay.requests().await.is_empty());
}

#[tokio::test]
async fn test_throttle_rotates_sigv4_credentials() {
    let relay = MockBedrockRelay::start().await;
    relay.mock_status(429).await;
    let mux = mux_with_relay(
        &[("bedrock.credentials", "AKIAONE:s1 AKIATWO:s2")],
        &relay.url(),
    )
    .await;

    let error = run_chat(&mux, CLAUDE_MODEL).await.expect_err("throttled");
    assert_eq!(error.status(), Some(429));

    let requests = relay.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(header_of(&requests[0], "authorization").contains("Credential=AKIAONE/"));
    assert!(header_of(&requests[1], "authorization").contains("Credential=AKIATWO/"));
}
