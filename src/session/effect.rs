//! Effects produced by state transitions

use crate::attachment::Attachment;
use crate::llm::{LlmErrorKind, Reply, Role};
use serde::Serialize;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message with a fresh id and timestamp
    AppendMessage {
        role: Role,
        content: String,
        sources: Vec<String>,
    },

    /// Drop every message
    ClearHistory,

    /// Put an attachment in the single slot
    StageAttachment(Attachment),

    /// Empty the attachment slot
    ClearAttachment,

    /// Invalidate results of every earlier request
    AdvanceEpoch,

    /// Send the current history to the completion service
    RequestCompletion { epoch: u64 },

    /// Stop the in-flight completion request, if any
    AbortCompletion,

    /// Surface a notice to the user
    Notify(Notice),
}

impl Effect {
    pub fn append_user_message(content: String) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content,
            sources: vec![],
        }
    }

    pub fn append_reply(reply: Reply) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: reply.content,
            sources: reply.sources,
        }
    }
}

/// User-visible notices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    AttachmentStaged { name: String },
    AttachmentRejected { name: String, reason: String },
    CompletionFailed { kind: LlmErrorKind, message: String },
    Rejected { reason: String },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::AttachmentStaged { .. } => "File selected",
            Notice::AttachmentRejected { .. } => "Invalid file type",
            Notice::CompletionFailed { .. } | Notice::Rejected { .. } => "Error",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Notice::AttachmentStaged { name } => format!("{name} is ready to upload"),
            Notice::AttachmentRejected { reason, .. } | Notice::Rejected { reason } => {
                reason.clone()
            }
            Notice::CompletionFailed { kind, .. } if kind.is_configuration() => {
                "Failed to get response from AI. Check the API key configuration.".to_string()
            }
            Notice::CompletionFailed { .. } => "Failed to get response from AI.".to_string(),
        }
    }

    /// Whether the notice reports something that went wrong
    pub fn is_destructive(&self) -> bool {
        !matches!(self, Notice::AttachmentStaged { .. })
    }
}
