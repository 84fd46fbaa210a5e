//! API request and response types

use crate::attachment::Attachment;
use crate::catalog::ChatSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to send a user turn
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub text: String,
}

/// Request to stage a file for the next turn
#[derive(Debug, Deserialize)]
pub struct AttachmentRequest {
    pub name: String,
    /// Guessed from the name when absent
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// The staged file and what the picker should offer
#[derive(Debug, Serialize)]
pub struct AttachmentSlotResponse {
    pub attachment: Option<Attachment>,
    pub accepted_extensions: &'static [&'static str],
}

/// Response for accepted session actions
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

/// Response for actions that complete immediately
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// One row of the chat list, with display fields precomputed
#[derive(Debug, Serialize)]
pub struct ChatListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub age: String,
    pub message_count: u32,
    pub topics: Vec<String>,
    pub hidden_topics: usize,
}

impl ChatListItem {
    pub fn from_summary(summary: &ChatSummary, now: DateTime<Utc>) -> Self {
        let (topics, hidden_topics) = summary.visible_topics();
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            preview: summary.preview.clone(),
            created_at: summary.created_at,
            age: summary.relative_age(now),
            message_count: summary.message_count,
            topics: topics.to_vec(),
            hidden_topics,
        }
    }
}

/// Response with the chat list
#[derive(Debug, Serialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatListItem>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
