//! Server-sent event framing for streamed answers.
//!
//! ```text
//! data: <increment>          one per text increment
//! event: meta
//! data: {"kind":..,"need":..,"sources":..,"recipe":..}
//! data: [DONE]
//! ```
//!
//! Dropping the response body (client disconnect) drops the
//! [`AnswerStream`], which cancels the dispatcher.

use std::convert::Infallible;

use axum::http::{header, HeaderName};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use crate::application::{AnswerMeta, AnswerStream, StreamEvent};

/// End-of-stream marker.
pub const DONE_MARKER: &str = "[DONE]";

static X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Wraps a dispatched answer as a `text/event-stream` response.
pub fn sse_response(stream: AnswerStream) -> Response {
    let events = stream.map(|event| Ok::<_, Infallible>(to_sse_event(event)));
    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING.clone(), "no"),
        ],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

fn to_sse_event(event: StreamEvent) -> Event {
    match event {
        // SSE frames cannot carry bare carriage returns
        StreamEvent::Delta(text) => Event::default().data(text.replace('\r', "")),
        StreamEvent::Meta(meta) => meta_event(&meta),
        StreamEvent::Done => Event::default().data(DONE_MARKER),
    }
}

fn meta_event(meta: &AnswerMeta) -> Event {
    match serde_json::to_string(meta) {
        Ok(json) => Event::default().event("meta").data(json),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize answer metadata");
            Event::default().event("meta").data("{}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::StreamingDispatcher;
    use crate::domain::answer::AnswerComposer;
    use crate::domain::brewing::Slot;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn frames_deltas_meta_and_done() {
        let answer = AnswerComposer::new()
            .compose_question("How many grams of coffee are you dosing?", vec![Slot::DoseG]);
        let stream = StreamingDispatcher::new(4).dispatch(answer);

        let response = sse_response(stream);
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-cache");
        assert_eq!(response.headers().get("x-accel-buffering").unwrap(), "no");
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        let body = body_text(response).await;
        let question = body.find("data: How many grams").unwrap();
        let meta = body.find("event: meta").unwrap();
        let done = body.find("data: [DONE]").unwrap();
        assert!(question < meta && meta < done);
        assert!(body.contains(r#""need":["dose_g"]"#));
    }
}
