//! Mock completion clients for testing
//!
//! These mocks enable runtime tests without real network I/O.

use crate::llm::{ChatMessage, CompletionClient, LlmError, Reply};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Completion Client
// ============================================================================

/// Mock client that returns queued replies
pub struct MockCompletionClient {
    responses: Mutex<VecDeque<Result<Reply, LlmError>>>,
    model_id: String,
    /// Record of every history sent
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
    /// When set, each request waits for a [`release`](Self::release)
    gate: Option<Notify>,
}

impl MockCompletionClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold every request until the test releases it
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    /// Let one held request through
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn queue_reply(&self, reply: Reply) {
        self.responses.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(&self, history: &[ChatMessage]) -> Result<Reply, LlmError> {
        self.requests.lock().unwrap().push(history.to_vec());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Delayed Mock Client
// ============================================================================

/// Mock client that sleeps before answering, for cancellation and timeout tests
pub struct DelayedMockClient {
    inner: MockCompletionClient,
    delay: Duration,
    /// Notified as soon as a request begins
    pub request_started: Arc<Notify>,
}

impl DelayedMockClient {
    pub fn new(model_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: MockCompletionClient::new(model_id),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: Reply) {
        self.inner.queue_reply(reply);
    }
}

#[async_trait]
impl CompletionClient for DelayedMockClient {
    async fn complete(&self, history: &[ChatMessage]) -> Result<Reply, LlmError> {
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.complete(history).await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_queue() {
        let mock = MockCompletionClient::new("test-model");
        mock.queue_reply(Reply::new("Hello", vec![]));

        let history = vec![ChatMessage::user("Hi")];
        let reply = mock.complete(&history).await.unwrap();
        assert_eq!(reply.content, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.complete(&history).await.is_err());
        assert_eq!(mock.recorded_requests(), vec![history.clone(), history]);
    }

    #[tokio::test]
    async fn test_gated_client_waits_for_release() {
        let mock = Arc::new(MockCompletionClient::new("test-model").gated());
        mock.queue_reply(Reply::new("held", vec![]));

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.complete(&[ChatMessage::user("Hi")]).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());

        mock.release();
        let reply = task.await.unwrap().unwrap();
        assert_eq!(reply.content, "held");
    }
}
