//! Short-term memory: a sliding window of recent messages.

use maestro_llm::MessageRole;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};

/// Default window size
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// A message held in short-term memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMessage {
    /// Speaker
    pub role: MessageRole,
    /// Text content
    pub content: String,
    /// Free-form annotations
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Sliding-window conversation memory; the oldest message is evicted first.
#[derive(Debug, Clone)]
pub struct ShortTermMemory {
    max_messages: usize,
    messages: VecDeque<MemoryMessage>,
    metadata: HashMap<String, Value>,
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

impl ShortTermMemory {
    /// Create a memory holding at most `max_messages` (minimum 1)
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        let max_messages = max_messages.max(1);
        Self {
            max_messages,
            messages: VecDeque::with_capacity(max_messages),
            metadata: HashMap::new(),
        }
    }

    /// Window size
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_messages
    }

    /// Number of messages currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no messages are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, evicting the oldest when full
    pub fn add_message(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) {
        if self.messages.len() == self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(MemoryMessage {
            role,
            content: content.into(),
            metadata: metadata.unwrap_or_default(),
        });
    }

    /// The most recent `last_n` messages, or all of them
    #[must_use]
    pub fn get_messages(&self, last_n: Option<usize>) -> Vec<&MemoryMessage> {
        let skip = match last_n {
            Some(n) if n > 0 => self.messages.len().saturating_sub(n),
            _ => 0,
        };
        self.messages.iter().skip(skip).collect()
    }

    /// Drop every message (metadata is kept)
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Recent conversation rendered as `ROLE: content` lines
    #[must_use]
    pub fn context_string(&self, last_n: usize) -> String {
        self.get_messages(Some(last_n))
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Store conversation-level metadata
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Look up conversation-level metadata
    #[must_use]
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_evicts_oldest() {
        let mut memory = ShortTermMemory::new(3);
        for i in 0..5 {
            memory.add_message(MessageRole::User, format!("m{}", i), None);
        }
        assert_eq!(memory.len(), 3);
        let contents: Vec<&str> = memory
            .get_messages(None)
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_context_string() {
        let mut memory = ShortTermMemory::default();
        memory.add_message(MessageRole::User, "hello", None);
        memory.add_message(MessageRole::Assistant, "hi there", None);
        memory.add_message(MessageRole::User, "bye", None);

        assert_eq!(memory.context_string(2), "ASSISTANT: hi there\nUSER: bye");
        assert_eq!(memory.get_messages(Some(10)).len(), 3);
    }

    #[test]
    fn test_metadata_survives_clear() {
        let mut memory = ShortTermMemory::default();
        memory.set_metadata("topic", Value::from("rust"));
        memory.add_message(MessageRole::User, "x", None);
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.get_metadata("topic"), Some(&Value::from("rust")));
    }
}
