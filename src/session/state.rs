//! Session state types

use crate::attachment::Attachment;
use crate::llm::{ChatMessage, LlmErrorKind, Role};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the session is in its request cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// No pending request
    #[default]
    Idle,
    /// Exactly one completion in flight, tagged with the epoch it was issued in
    Sending { epoch: u64 },
    /// The last send failed; history is as it was after the user turn
    Error { message: String, kind: LlmErrorKind },
}

impl SessionState {
    pub fn tag(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Sending { .. } => "sending",
            SessionState::Error { .. } => "error",
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self, SessionState::Sending { .. })
    }
}

/// A single turn in the conversation. Never changed after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<String>,
}

impl Message {
    /// The role and content sent to the completion service
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

/// Session data the transition function reads besides the state tag
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Bumped on every new request, reset and cancel
    pub epoch: u64,
    pub attachment: Option<Attachment>,
}

/// What the presentation layer sees
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub messages: Vec<Message>,
    pub attachment: Option<Attachment>,
}
