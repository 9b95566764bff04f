//! Wire-format decoding observed through the adapter surface.

use crate::helpers::*;
use crate::mock_providers::*;
use bytes::Bytes;
use futures::{stream, StreamExt};
use mux_core::{BodyStream, ChatTurn, MuxError, StreamEvent};
use mux_providers::{GenerationConfig, ProviderKind};
use mux_streaming::{decode_sse, DeltaPath};
use tokio_util::sync::CancellationToken;

/// The OpenAI decode path yields one delta per chunk and a single `Done`
/// on the sentinel.
#[tokio::test]
async fn test_openai_stream_event_sequence() {
    let mock = MockOpenAi::start().await;
    mock.mock_completion(&["Hi", " there"]).await;
    let mux = mux_with(&[
        ("openai.api_key", "sk-test"),
        ("openai.base_url", &mock.url()),
    ])
    .await;

    let stream = mux
        .stream_chat(
            ProviderKind::OpenAi,
            &[ChatTurn::user("hello")],
            &GenerationConfig::new("gpt-4o"),
            &CancellationToken::new(),
        )
        .await
        .expect("stream");

    let events: Vec<StreamEvent> = stream.collect().await;
    assert_eq!(
        events,
        vec![
            StreamEvent::delta("Hi"),
            StreamEvent::delta(" there"),
            StreamEvent::Done,
        ],
    );
}

/// DeepSeek and OpenRouter ride the same wire shape as OpenAI.
#[tokio::test]
async fn test_openai_family_shares_wire_shape() {
    for (kind, base_setting, key_setting, model) in [
        (
            ProviderKind::DeepSeek,
            "deepseek.base_url",
            "deepseek.api_key",
            "deepseek-chat",
        ),
        (
            ProviderKind::OpenRouter,
            "openrouter.base_url",
            "openrouter.api_key",
            "anthropic/claude-sonnet-4",
        ),
    ] {
        let mock = MockOpenAi::start().await;
        mock.mock_completion(&["ok"]).await;
        let mux = mux_with(&[(key_setting, "sk-test"), (base_setting, &mock.url())]).await;

        let text = mux
            .chat(
                kind,
                &[ChatTurn::user("hello")],
                &GenerationConfig::new(model),
                &CancellationToken::new(),
            )
            .await
            .expect("completion");
        assert_eq!(text, "ok", "{kind:?}");
    }
}

/// Gemini authenticates with a `key` query parameter and streams without a
/// terminating sentinel.
#[tokio::test]
async fn test_gemini_stream_and_query_key() {
    let mock = MockGemini::start().await;
    mock.mock_generate("gemini-2.0-flash", &["Hi ", "Gemini"]).await;
    let mux = mux_with(&[
        ("gemini.api_key", "g-key"),
        ("gemini.base_url", &mock.url()),
    ])
    .await;

    let text = mux
        .chat(
            ProviderKind::Gemini,
            &[ChatTurn::user("hello")],
            &GenerationConfig::new("gemini-2.0-flash"),
            &CancellationToken::new(),
        )
        .await
        .expect("completion");
    assert_eq!(text, "Hi Gemini");

    let requests = mock.requests().await;
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("alt=sse"), "query was `{query}`");
    assert!(query.contains("key=g-key"), "query was `{query}`");
    assert!(requests[0].headers.get("authorization").is_none());
}

/// The Anthropic decode path reads event-typed SSE frames.
#[tokio::test]
async fn test_anthropic_stream() {
    let mock = MockAnthropic::start().await;
    mock.mock_messages(&["Yo"]).await;
    let mux = mux_with(&[
        ("anthropic.api_key", "sk-ant"),
        ("anthropic.base_url", &mock.url()),
    ])
    .await;

    let text = mux
        .chat(
            ProviderKind::Anthropic,
            &[ChatTurn::user("hello")],
            &GenerationConfig::new("claude-sonnet-4"),
            &CancellationToken::new(),
        )
        .await
        .expect("completion");
    assert_eq!(text, "Yo");
}

/// An error event after headers surfaces as a stream error, not a
/// provider status error.
#[tokio::test]
async fn test_stream_error_event_surfaces() {
    let mock = MockAnthropic::start().await;
    mock.mock_error_stream("overloaded_error", "Overloaded").await;
    let mux = mux_with(&[
        ("anthropic.api_key", "sk-ant"),
        ("anthropic.base_url", &mock.url()),
    ])
    .await;

    let err = mux
        .chat(
            ProviderKind::Anthropic,
            &[ChatTurn::user("hello")],
            &GenerationConfig::new("claude-sonnet-4"),
            &CancellationToken::new(),
        )
        .await
        .expect_err("stream error");

    assert!(matches!(err, MuxError::Stream { .. }));
    assert!(err.to_string().contains("overloaded_error"));
}

/// Cancelling mid-stream ends the event sequence without a terminal event,
/// keeping the text that already arrived.
#[tokio::test]
async fn test_cancellation_mid_stream_keeps_partial_output() {
    let line = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n";
    let body: BodyStream = Box::pin(
        stream::iter(vec![Ok::<_, MuxError>(Bytes::from_static(line.as_bytes()))])
            .chain(stream::pending()),
    );

    let cancel = CancellationToken::new();
    let mut events = decode_sse(body, DeltaPath::OpenAiChat, cancel.clone());

    assert_eq!(events.next().await, Some(StreamEvent::delta("partial")));
    cancel.cancel();
    assert_eq!(events.next().await, None);
}
