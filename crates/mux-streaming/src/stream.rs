//! The caller-facing completion stream.

use futures::stream::{BoxStream, Stream, StreamExt};
use mux_core::{MuxError, MuxResult, StreamEvent};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// A finite stream of [`StreamEvent`]s from one completion call.
    ///
    /// The stream is fused on its terminal event: after yielding `Done` or
    /// `Error` it yields nothing further, whatever the decoder underneath
    /// would still produce.
    pub struct CompletionStream {
        #[pin]
        inner: BoxStream<'static, StreamEvent>,
        done: bool,
    }
}

impl CompletionStream {
    /// Wrap a decoder's event sequence.
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = StreamEvent> + Send + 'static,
    {
        Self {
            inner: inner.boxed(),
            done: false,
        }
    }

    /// Whether a terminal event has been yielded.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Drain the stream into the full response text.
    ///
    /// Deltas are concatenated in order. A carried `Error` event surfaces as
    /// [`MuxError::Stream`]; an end without a terminal event (a cancelled
    /// read) returns whatever text arrived before the cut.
    pub async fn collect_text(mut self) -> MuxResult<String> {
        let mut text = String::new();
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Delta { text: fragment } => text.push_str(&fragment),
                StreamEvent::Done => break,
                StreamEvent::Error { message } => return Err(MuxError::stream(message)),
            }
        }
        Ok(text)
    }
}

impl Stream for CompletionStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    *this.done = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                *this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for CompletionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionStream")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
