//! Events that drive the session

use crate::attachment::Attachment;
use crate::llm::{LlmError, Reply};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        text: String,
    },
    SelectAttachment {
        file: Option<Attachment>,
    },
    RemoveAttachment,
    NewChat,
    Cancel,

    // Completion events, tagged with the epoch of the request that produced them
    CompletionSucceeded {
        epoch: u64,
        reply: Reply,
    },
    CompletionFailed {
        epoch: u64,
        error: LlmError,
    },
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::Submit { text: text.into() }
    }

    #[cfg(test)]
    pub fn select_attachment(file: Attachment) -> Self {
        Event::SelectAttachment { file: Some(file) }
    }
}
