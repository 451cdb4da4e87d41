//! Streaming dispatcher - incremental, cancellable delivery of an answer.
//!
//! A dispatch spawns one producer task that feeds a bounded channel. The
//! consumer side is an [`AnswerStream`]: it yields the text increments in
//! reading order, then one [`StreamEvent::Meta`], then [`StreamEvent::Done`].
//!
//! Cancellation goes through a [`CancellationToken`] shared by both sides.
//! Once cancelled (explicitly, or by dropping the stream) the consumer yields
//! nothing further and the producer exits at its next suspension point,
//! dropping any generation stream it holds.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::answer::{Answer, AnswerKind};
use crate::domain::brewing::{Recipe, Slot};
use crate::ports::ChunkStream;

/// Structured trailer sent after the last text increment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerMeta {
    pub kind: AnswerKind,
    pub need: Vec<Slot>,
    #[serde(rename = "sources")]
    pub citations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
}

impl AnswerMeta {
    pub fn from_answer(answer: &Answer) -> Self {
        Self {
            kind: answer.kind,
            need: answer.need.clone(),
            citations: answer.citations.clone(),
            recipe: answer.recipe().cloned(),
        }
    }
}

/// One item of a dispatched answer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text increment.
    Delta(String),
    /// Answer metadata, sent once after the last increment.
    Meta(AnswerMeta),
    /// End-of-stream marker.
    Done,
}

/// Splits rendered text into line increments whose concatenation is the
/// rendered text.
pub fn line_increments(rendered: &str) -> Vec<String> {
    if rendered.is_empty() {
        return Vec::new();
    }
    rendered.split_inclusive('\n').map(str::to_string).collect()
}

/// Spawns producers for dispatched answers.
#[derive(Debug, Clone)]
pub struct StreamingDispatcher {
    buffer: usize,
    first_token_timeout: Duration,
}

impl Default for StreamingDispatcher {
    fn default() -> Self {
        Self::new(16)
    }
}

impl StreamingDispatcher {
    /// `buffer` is the channel capacity; values below 1 are raised to 1.
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            first_token_timeout: Duration::from_secs(8),
        }
    }

    /// How long a phrased dispatch waits for the first generated token
    /// before falling back to the deterministic text.
    pub fn with_first_token_timeout(mut self, timeout: Duration) -> Self {
        self.first_token_timeout = timeout;
        self
    }

    /// Streams the deterministic rendering of `answer`, line by line.
    pub fn dispatch(&self, answer: Answer) -> AnswerStream {
        self.spawn(move |sink| async move {
            let meta = AnswerMeta::from_answer(&answer);
            for increment in line_increments(&answer.render()) {
                sink.send(StreamEvent::Delta(increment)).await?;
            }
            sink.finish(meta).await
        })
    }

    /// Streams generated text for `answer`.
    ///
    /// If generation fails or stays silent before its first token, the
    /// deterministic rendering is streamed instead. A failure after the
    /// first token ends the text where it stopped; the trailer still follows.
    pub fn dispatch_phrased(&self, answer: Answer, chunks: ChunkStream) -> AnswerStream {
        let first_token_timeout = self.first_token_timeout;

        self.spawn(move |sink| async move {
            let meta = AnswerMeta::from_answer(&answer);
            let mut chunks = chunks;
            let mut delivered = false;

            loop {
                let next = if delivered {
                    sink.guard(chunks.next()).await?
                } else {
                    match sink
                        .guard(tokio::time::timeout(first_token_timeout, chunks.next()))
                        .await?
                    {
                        Ok(next) => next,
                        Err(_) => {
                            tracing::warn!(
                                timeout_ms = first_token_timeout.as_millis() as u64,
                                "no generated token in time, using deterministic text"
                            );
                            break;
                        }
                    }
                };

                match next {
                    Some(Ok(chunk)) if chunk.is_final() => break,
                    Some(Ok(chunk)) => {
                        if chunk.delta.is_empty() {
                            continue;
                        }
                        delivered = true;
                        sink.send(StreamEvent::Delta(chunk.delta)).await?;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, delivered, "generation stream failed");
                        break;
                    }
                    None => break,
                }
            }
            drop(chunks);

            if !delivered {
                for increment in line_increments(&answer.render()) {
                    sink.send(StreamEvent::Delta(increment)).await?;
                }
            }
            sink.finish(meta).await
        })
    }

    fn spawn<F, Fut>(&self, produce: F) -> AnswerStream
    where
        F: FnOnce(Sink) -> Fut,
        Fut: std::future::Future<Output = Result<(), Cancelled>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.buffer);
        let token = CancellationToken::new();
        let sink = Sink {
            tx,
            token: token.clone(),
        };

        let producer = produce(sink);
        tokio::spawn(async move {
            if producer.await.is_err() {
                tracing::debug!("dispatch cancelled");
            }
        });

        AnswerStream {
            rx,
            token,
            finished: false,
        }
    }
}

/// The consumer went away or cancelled.
#[derive(Debug)]
struct Cancelled;

/// Producer half: every send and wait races the cancellation token.
struct Sink {
    tx: mpsc::Sender<StreamEvent>,
    token: CancellationToken,
}

impl Sink {
    async fn send(&self, event: StreamEvent) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Cancelled),
            sent = self.tx.send(event) => sent.map_err(|_| Cancelled),
        }
    }

    async fn guard<F: std::future::Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Cancelled),
            out = fut => Ok(out),
        }
    }

    async fn finish(&self, meta: AnswerMeta) -> Result<(), Cancelled> {
        self.send(StreamEvent::Meta(meta)).await?;
        self.send(StreamEvent::Done).await
    }
}

/// Consumer half of a dispatch.
///
/// Finite and not restartable. Dropping it cancels the producer.
#[derive(Debug)]
pub struct AnswerStream {
    rx: mpsc::Receiver<StreamEvent>,
    token: CancellationToken,
    finished: bool,
}

impl AnswerStream {
    /// Stops the dispatch. No event is yielded after this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A token that cancels this dispatch, for wiring to a transport.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Stream for AnswerStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished || self.token.is_cancelled() {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(StreamEvent::Done)) => {
                self.finished = true;
                Poll::Ready(Some(StreamEvent::Done))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Drop for AnswerStream {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
