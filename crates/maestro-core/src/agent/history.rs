//! Bounded conversation history sent to the model on every call.

use maestro_llm::Message;
use std::collections::VecDeque;

/// Default number of messages kept
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Sliding window of committed messages; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    window: usize,
    messages: VecDeque<Message>,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ConversationHistory {
    /// Create a history holding at most `window` messages
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            messages: VecDeque::with_capacity(window),
        }
    }

    /// Configured window size
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Commit a user message and the reply that answered it
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(Message::user(user));
        self.push(Message::assistant(assistant));
    }

    fn push(&mut self, message: Message) {
        if self.window == 0 {
            return;
        }
        while self.messages.len() >= self.window {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Committed messages, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Number of committed messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been committed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
