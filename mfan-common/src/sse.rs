//! Server-Sent Events (SSE) utilities
//!
//! Turns a per-session event channel into an axum SSE response. Frames are
//! plain `data: <json>\n\n`; the event kind travels inside the JSON.

use crate::events::SearchEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Keep-alive comment interval
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Encode one event as an SSE frame.
///
/// Serialization of these types cannot fail in practice; if it does the
/// frame degrades to an `error` event so the client still sees a terminal.
pub fn to_sse_event(event: &SearchEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(json) => Event::default().data(json),
        Err(e) => {
            error!("SSE: failed to serialize {} event: {}", event.event_type(), e);
            Event::default().data(r#"{"type":"error","error":"serialization failure"}"#)
        }
    }
}

/// Build an SSE response that drains `rx` until a terminal event is sent or
/// the writer closes it.
///
/// Dropping the response (client disconnect) drops the receiver, which makes
/// the writer's next send fail.
pub fn event_channel_sse(
    mut rx: mpsc::Receiver<SearchEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            debug!("SSE: sending {} event", event.event_type());
            let terminal = event.is_terminal();
            yield Ok(to_sse_event(&event));
            if terminal {
                break;
            }
        }
        debug!("SSE: event channel closed");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[tokio::test]
    async fn test_frames_are_plain_data_lines() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(SearchEvent::error("policy unavailable")).await.unwrap();
        drop(tx);

        let response = event_channel_sse(rx).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();

        assert_eq!(
            body,
            "data: {\"type\":\"error\",\"error\":\"policy unavailable\"}\n\n"
        );
    }

    #[tokio::test]
    async fn test_stream_ends_after_terminal_event() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(SearchEvent::Complete {
            results: Vec::new(),
            total: 0,
            completed_sources: 0,
            failed_sources: 0,
        })
        .await
        .unwrap();
        tx.send(SearchEvent::error("late")).await.unwrap();

        // Sender still open: only the terminal event can end the body
        let response = event_channel_sse(rx).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        drop(tx);

        assert_eq!(body.matches("data: ").count(), 1);
        assert!(body.contains("\"type\":\"complete\""));
        assert!(!body.contains("late"));
    }
}
