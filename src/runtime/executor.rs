//! Session runtime executor

use super::{Command, SessionEvent, SessionHandle};
use crate::llm::{ChatMessage, CompletionClient, LlmError};
use crate::session::{
    transition, Effect, Event, Message, SessionContext, SessionSnapshot, SessionState,
    TransitionError,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Generic session runtime that can work with any completion client
pub struct SessionRuntime<C>
where
    C: CompletionClient + 'static,
{
    session_id: String,
    state: SessionState,
    context: SessionContext,
    messages: Vec<Message>,
    next_message_id: u64,
    client: Arc<C>,
    request_timeout: Duration,
    command_rx: mpsc::Receiver<Command>,
    /// Weak so the loop ends once every handle is gone
    command_tx: mpsc::WeakSender<Command>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Token to cancel the running completion request
    completion_cancel_token: Option<CancellationToken>,
}

impl<C> SessionRuntime<C>
where
    C: CompletionClient + 'static,
{
    pub fn new(client: C, request_timeout: Duration) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let runtime = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            state: SessionState::Idle,
            context: SessionContext::default(),
            messages: Vec::new(),
            next_message_id: 1,
            client: Arc::new(client),
            request_timeout,
            command_rx,
            command_tx: command_tx.downgrade(),
            broadcast_tx: broadcast_tx.clone(),
            snapshot_tx,
            completion_cancel_token: None,
        };

        let handle = SessionHandle {
            command_tx,
            broadcast_tx,
            snapshot_rx,
        };

        (runtime, handle)
    }

    /// Start the runtime in the background and return its handle
    pub fn spawn(client: C, request_timeout: Duration) -> SessionHandle {
        let (runtime, handle) = Self::new(client, request_timeout);
        tokio::spawn(runtime.run());
        handle
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, model = %self.client.model_id(), "Starting session runtime");

        while let Some(command) = self.command_rx.recv().await {
            let Command { event, ack } = command;
            let outcome = self.process_event(event);
            if let Some(ack) = ack {
                let _ = ack.send(outcome);
            }
        }

        if let Some(token) = self.completion_cancel_token.take() {
            token.cancel();
        }
        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) if e.is_user_facing() => {
                tracing::warn!(session_id = %self.session_id, error = %e, "Rejected session event");
                let _ = self.broadcast_tx.send(SessionEvent::Notice(e.to_notice()));
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(session_id = %self.session_id, error = %e, "Discarding stale completion result");
                return Err(e);
            }
        };

        let old_state = std::mem::replace(&mut self.state, result.new_state);

        for effect in result.effects {
            self.execute_effect(effect);
        }

        if !self.state.is_sending() {
            self.completion_cancel_token = None;
        }

        if old_state != self.state {
            tracing::debug!(
                session_id = %self.session_id,
                from = old_state.tag(),
                to = self.state.tag(),
                "Session state changed"
            );
            let _ = self.broadcast_tx.send(SessionEvent::StateChange {
                state: self.state.clone(),
            });
        }

        self.publish_snapshot();
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage {
                role,
                content,
                sources,
            } => {
                let message = Message {
                    id: self.next_message_id,
                    role,
                    content,
                    timestamp: Utc::now(),
                    sources,
                };
                self.next_message_id += 1;
                self.messages.push(message.clone());
                let _ = self.broadcast_tx.send(SessionEvent::Message { message });
            }

            Effect::ClearHistory => {
                self.messages.clear();
                let _ = self.broadcast_tx.send(SessionEvent::HistoryCleared);
            }

            Effect::StageAttachment(file) => {
                self.context.attachment = Some(file);
                self.broadcast_attachment();
            }

            Effect::ClearAttachment => {
                if self.context.attachment.take().is_some() {
                    self.broadcast_attachment();
                }
            }

            Effect::AdvanceEpoch => {
                self.context.epoch += 1;
            }

            Effect::RequestCompletion { epoch } => self.request_completion(epoch),

            Effect::AbortCompletion => {
                if let Some(token) = self.completion_cancel_token.take() {
                    tracing::info!(session_id = %self.session_id, "Aborting completion request");
                    token.cancel();
                }
            }

            Effect::Notify(notice) => {
                let _ = self.broadcast_tx.send(SessionEvent::Notice(notice));
            }
        }
    }

    /// Spawn the completion request as a background task. Its result comes
    /// back as an event tagged with `epoch`.
    fn request_completion(&mut self, epoch: u64) {
        let Some(event_tx) = self.command_tx.upgrade() else {
            // No handles left, nobody could observe the reply
            return;
        };

        let cancel_token = CancellationToken::new();
        self.completion_cancel_token = Some(cancel_token.clone());

        let history: Vec<ChatMessage> = self.messages.iter().map(Message::to_chat_message).collect();
        let client = self.client.clone();
        let request_timeout = self.request_timeout;
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            tracing::info!(session_id = %session_id, epoch, turns = history.len(), "Requesting completion (background)");

            // Race the request against cancellation
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::info!(session_id = %session_id, epoch, "Completion request cancelled");
                }

                result = tokio::time::timeout(request_timeout, client.complete(&history)) => {
                    let event = match result {
                        Ok(Ok(reply)) => Event::CompletionSucceeded { epoch, reply },
                        Ok(Err(error)) => Event::CompletionFailed { epoch, error },
                        Err(_) => {
                            // The client future is dropped here, so its own logging never runs
                            tracing::error!(
                                session_id = %session_id,
                                epoch,
                                timeout_ms = %request_timeout.as_millis(),
                                "Completion request timed out"
                            );
                            Event::CompletionFailed {
                                epoch,
                                error: LlmError::timeout(format!(
                                    "No reply within {}ms",
                                    request_timeout.as_millis()
                                )),
                            }
                        }
                    };
                    let _ = event_tx.send(Command::internal(event)).await;
                }
            }
        });
    }

    fn broadcast_attachment(&self) {
        let _ = self.broadcast_tx.send(SessionEvent::AttachmentChanged {
            attachment: self.context.attachment.clone(),
        });
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            state: self.state.clone(),
            messages: self.messages.clone(),
            attachment: self.context.attachment.clone(),
        });
    }
}
