//! Runtime for a conversation session
//!
//! One task owns the session data and applies events one at a time, so the
//! history needs no locking. Completion requests run as separate tasks and
//! report back through the same channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::attachment::Attachment;
use crate::session::{Event, Message, Notice, SessionSnapshot, SessionState, TransitionError};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Events sent to subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChange { state: SessionState },
    Message { message: Message },
    AttachmentChanged { attachment: Option<Attachment> },
    HistoryCleared,
    Notice(Notice),
}

/// Errors returned to callers of a [`SessionHandle`]
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session runtime has stopped")]
    Closed,
}

/// An event plus an optional channel to report whether it was accepted
pub(crate) struct Command {
    event: Event,
    ack: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl Command {
    pub(crate) fn internal(event: Event) -> Self {
        Self { event, ack: None }
    }
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Send a user turn. Returns once the turn is in the history and the
    /// request has started, not when the reply arrives.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.dispatch(Event::submit(text)).await
    }

    pub async fn select_attachment(&self, file: Option<Attachment>) -> Result<(), SessionError> {
        self.dispatch(Event::SelectAttachment { file }).await
    }

    pub async fn remove_attachment(&self) -> Result<(), SessionError> {
        self.dispatch(Event::RemoveAttachment).await
    }

    pub async fn new_chat(&self) -> Result<(), SessionError> {
        self.dispatch(Event::NewChat).await
    }

    pub async fn cancel(&self) -> Result<(), SessionError> {
        self.dispatch(Event::Cancel).await
    }

    /// Current state, history and staged attachment
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    async fn dispatch(&self, event: Event) -> Result<(), SessionError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command_tx
            .send(Command {
                event,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        ack_rx.await.map_err(|_| SessionError::Closed)??;
        Ok(())
    }
}
