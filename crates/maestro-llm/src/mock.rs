//! Mock LLM Provider for testing
//!
//! Returns scripted replies in order and records every request it receives.

use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Scripted {
    Reply(String),
    Failure(String),
}

/// A mock LLM provider that returns queued responses or a fallback reply.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Mutex<String>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Mutex::new("mock response".to_string()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a provider that answers every request with the same text.
    #[must_use]
    pub fn always(reply: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.set_fallback(reply);
        provider
    }

    /// Add a reply to the queue.
    pub fn add_response(&self, content: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Reply(content.into()));
    }

    /// Queue a backend failure (surfaces as a network error).
    pub fn add_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Failure(message.into()));
    }

    /// Reply used once the queue is drained.
    pub fn set_fallback(&self, content: impl Into<String>) {
        *self.fallback.lock().unwrap_or_else(|e| e.into_inner()) = content.into();
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match next {
            Some(Scripted::Reply(content)) => content,
            Some(Scripted::Failure(message)) => return Err(Error::Network(message)),
            None => self
                .fallback
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        };

        let mut response = CompletionResponse::text(content, "mock-model");
        response.usage = Some(TokenUsage::new(10, 5));
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn test_queued_then_fallback() {
        let provider = MockProvider::new();
        provider.add_response("first");
        provider.add_failure("backend down");

        let request = CompletionRequest::new("").with_message(Message::user("hi"));
        let first = provider.complete(request.clone()).await.unwrap();
        assert_eq!(first.content, "first");

        let second = provider.complete(request.clone()).await;
        assert!(matches!(second, Err(Error::Network(_))));

        let third = provider.complete(request).await.unwrap();
        assert_eq!(third.content, "mock response");
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_always_records_requests() {
        let provider = MockProvider::always("fixed");
        let request = CompletionRequest::new("").with_message(Message::user("ping"));

        let response = tokio_test::block_on(provider.complete(request)).unwrap();
        assert_eq!(response.content, "fixed");
        assert_eq!(provider.requests()[0].messages[0].content, "ping");
    }
}
