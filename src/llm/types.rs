//! Common types for completion requests

use serde::{Deserialize, Serialize};

/// Shown when the service answers without any message content
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response.";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// The only part of a message that leaves the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[cfg(test)]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The next assistant turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    pub sources: Vec<String>,
}

impl Reply {
    pub fn new(content: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            content: content.into(),
            sources,
        }
    }

    /// Build a reply from possibly missing fields.
    ///
    /// Missing or empty content degrades to [`FALLBACK_REPLY`].
    pub fn from_parts(content: Option<String>, sources: Option<Vec<String>>) -> Self {
        let content = content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());
        Self {
            content,
            sources: sources.unwrap_or_default(),
        }
    }
}
