//! Chat catalog
//!
//! Lists saved conversations. Nothing is persisted yet, so the only
//! implementation serves a fixed set of demo chats and never has a saved
//! conversation to hand back.

use crate::session::Message;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Topics shown before collapsing the rest into a count
const VISIBLE_TOPICS: usize = 2;

/// Summary row for one saved conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub message_count: u32,
    pub topics: Vec<String>,
}

impl ChatSummary {
    /// Age as the chat list shows it: "Yesterday", "3 days ago", "2 weeks ago",
    /// or the date once it is older than a month. Only an identical
    /// timestamp counts as zero days.
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        let elapsed = (now - self.created_at).abs();
        // Any started day counts as a whole day
        let days = (elapsed.num_milliseconds() + 86_399_999) / 86_400_000;

        match days {
            1 => "Yesterday".to_string(),
            0 | 2..=7 => format!("{days} days ago"),
            8..=30 => format!("{} weeks ago", (days + 6) / 7),
            _ => self.created_at.format("%Y-%m-%d").to_string(),
        }
    }

    /// The first two topics plus how many were left out
    pub fn visible_topics(&self) -> (&[String], usize) {
        let shown = self.topics.len().min(VISIBLE_TOPICS);
        (&self.topics[..shown], self.topics.len() - shown)
    }
}

/// Source of saved conversations
#[async_trait]
pub trait ChatCatalog: Send + Sync {
    /// All saved conversations, newest first
    async fn list(&self) -> Vec<ChatSummary>;

    /// The saved messages of a conversation, if the catalog has them
    async fn load(&self, chat_id: &str) -> Option<Vec<Message>>;
}

/// In-memory catalog seeded with demo entries
pub struct StaticCatalog {
    chats: Vec<ChatSummary>,
}

impl StaticCatalog {
    pub fn new(chats: Vec<ChatSummary>) -> Self {
        Self { chats }
    }

    /// The three sample conversations, aged relative to `now`
    pub fn demo(now: DateTime<Utc>) -> Self {
        let chat = |id: &str, title: &str, preview: &str, days: i64, count: u32, topics: &[&str]| {
            ChatSummary {
                id: id.to_string(),
                title: title.to_string(),
                preview: preview.to_string(),
                created_at: now - Duration::days(days),
                message_count: count,
                topics: topics.iter().map(|t| (*t).to_string()).collect(),
            }
        };

        Self::new(vec![
            chat(
                "1",
                "Contract Review Assistance",
                "Help me understand this employment contract clause...",
                2,
                8,
                &["Employment Law", "Contracts"],
            ),
            chat(
                "2",
                "Tenant Rights Question",
                "What are my rights as a tenant when landlord...",
                7,
                12,
                &["Property Law", "Tenant Rights"],
            ),
            chat(
                "3",
                "Small Business Formation",
                "I'm starting a small business and need to know...",
                14,
                15,
                &["Business Law", "Corporate Formation"],
            ),
        ])
    }

    pub fn get(&self, chat_id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|c| c.id == chat_id)
    }
}

#[async_trait]
impl ChatCatalog for StaticCatalog {
    async fn list(&self) -> Vec<ChatSummary> {
        let mut chats = self.chats.clone();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        chats
    }

    async fn load(&self, chat_id: &str) -> Option<Vec<Message>> {
        tracing::debug!(chat_id, known = self.get(chat_id).is_some(), "No saved messages for chat");
        None
    }
}
