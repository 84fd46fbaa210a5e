//! Server-Sent Events support

use crate::runtime::SessionEvent;
use crate::session::SessionSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with the current snapshot
pub fn sse_stream(
    snapshot: SessionSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(to_sse_event(
            "init",
            json!({
                "type": "init",
                "state": snapshot.state,
                "messages": snapshot.messages,
                "attachment": snapshot.attachment,
            }),
        ))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => {
            let (event_type, data) = session_event_payload(event);
            Some(Ok(to_sse_event(event_type, data)))
        }
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_payload(event: SessionEvent) -> (&'static str, Value) {
    match event {
        SessionEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state
            }),
        ),
        SessionEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        SessionEvent::AttachmentChanged { attachment } => (
            "attachment",
            json!({
                "type": "attachment",
                "attachment": attachment
            }),
        ),
        SessionEvent::HistoryCleared => (
            "history_cleared",
            json!({
                "type": "history_cleared"
            }),
        ),
        SessionEvent::Notice(notice) => (
            "notice",
            json!({
                "type": "notice",
                "title": notice.title(),
                "description": notice.description(),
                "destructive": notice.is_destructive(),
                "notice": notice
            }),
        ),
    }
}

fn to_sse_event(event_type: &str, data: Value) -> Event {
    Event::default().event(event_type).data(data.to_string())
}
