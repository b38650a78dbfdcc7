//! Session analytics: a short log of completed turns per worker.

use chrono::{DateTime, Utc};
use maestro_llm::Message;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Turns retained in the log
pub const TURN_LOG_CAPACITY: usize = 10;

/// Stored reply length, in characters
pub const RESPONSE_PREVIEW_CHARS: usize = 200;

const QUERY_PREVIEW_CHARS: usize = 100;

/// One completed `think` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// When the turn finished
    pub timestamp: DateTime<Utc>,
    /// The message the worker was given
    pub query: String,
    /// The reply, truncated
    pub response: String,
    /// Capabilities invoked during the turn, in call order
    pub capabilities_used: Vec<String>,
    /// Tokens reported by the backend across all iterations
    pub token_count: u32,
}

/// Aggregate view of a worker's recent turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Turns currently in the log
    pub total_queries: usize,
    /// Sum of token counts
    pub total_tokens: u64,
    /// Invocation count per capability
    pub capabilities_used_count: BTreeMap<String, usize>,
    /// Mean tokens per turn, one decimal
    pub average_tokens_per_query: f64,
    /// Timestamp of the oldest retained turn
    pub session_start: Option<DateTime<Utc>>,
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Bounded log of recent turns
#[derive(Debug, Clone, Default)]
pub struct TurnLog {
    turns: VecDeque<ConversationTurn>,
}

impl TurnLog {
    /// Append a turn, evicting the oldest beyond capacity
    pub fn record(
        &mut self,
        query: &str,
        response: &str,
        capabilities_used: Vec<String>,
        token_count: u32,
    ) {
        if self.turns.len() == TURN_LOG_CAPACITY {
            self.turns.pop_front();
        }
        self.turns.push_back(ConversationTurn {
            timestamp: Utc::now(),
            query: query.to_string(),
            response: truncate_chars(response, RESPONSE_PREVIEW_CHARS),
            capabilities_used,
            token_count,
        });
    }

    /// Retained turns, oldest first
    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// Number of retained turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forget every turn
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// One-line digest of the last three turns
    #[must_use]
    pub fn memory_context(&self) -> String {
        let skip = self.turns.len().saturating_sub(3);
        self.turns
            .iter()
            .skip(skip)
            .map(|turn| {
                let tools = if turn.capabilities_used.is_empty() {
                    "None".to_string()
                } else {
                    turn.capabilities_used.join(", ")
                };
                format!(
                    "Q: {} | Tools: {}",
                    truncate_chars(&turn.query, QUERY_PREVIEW_CHARS),
                    tools
                )
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }

    /// Aggregate statistics over the retained turns
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let total_tokens: u64 = self.turns.iter().map(|t| u64::from(t.token_count)).sum();

        let mut capabilities_used_count = BTreeMap::new();
        for name in self.turns.iter().flat_map(|t| t.capabilities_used.iter()) {
            *capabilities_used_count.entry(name.clone()).or_insert(0) += 1;
        }

        let average_tokens_per_query = if self.turns.is_empty() {
            0.0
        } else {
            (total_tokens as f64 / self.turns.len() as f64 * 10.0).round() / 10.0
        };

        SessionSummary {
            total_queries: self.turns.len(),
            total_tokens,
            capabilities_used_count,
            average_tokens_per_query,
            session_start: self.turns.front().map(|t| t.timestamp),
        }
    }
}

/// Rough prompt-size estimate against a model context window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextUsage {
    /// Estimated prompt tokens (about four characters per token)
    pub estimated_tokens: usize,
    /// Model context window
    pub context_window: usize,
    /// Share of the window used, one decimal
    pub usage_percent: f64,
    /// Tokens left; negative when over budget
    pub remaining_tokens: i64,
}

impl ContextUsage {
    /// Estimate usage for `messages`
    #[must_use]
    pub fn estimate(messages: &[Message], context_window: usize) -> Self {
        let chars: usize = messages
            .iter()
            .map(|m| serde_json::to_string(m).map_or(m.content.len(), |s| s.len()))
            .sum();
        let estimated_tokens = chars / 4;
        let usage_percent = if context_window == 0 {
            100.0
        } else {
            (estimated_tokens as f64 / context_window as f64 * 1000.0).round() / 10.0
        };

        Self {
            estimated_tokens,
            context_window,
            usage_percent,
            remaining_tokens: context_window as i64 - estimated_tokens as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_truncated() {
        let mut log = TurnLog::default();
        log.record("q", &"x".repeat(500), Vec::new(), 0);
        let turn = log.turns().next().unwrap();
        assert_eq!(turn.response.chars().count(), RESPONSE_PREVIEW_CHARS);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = TurnLog::default();
        for i in 0..15 {
            log.record(&format!("q{}", i), "a", Vec::new(), 1);
        }
        assert_eq!(log.len(), TURN_LOG_CAPACITY);
        assert_eq!(log.turns().next().unwrap().query, "q5");
    }

    #[test]
    fn test_summary() {
        let mut log = TurnLog::default();
        assert_eq!(log.summary().total_queries, 0);
        assert_eq!(log.summary().average_tokens_per_query, 0.0);

        log.record("a", "r", vec!["web_search".into(), "web_search".into()], 10);
        log.record("b", "r", vec!["read_file".into()], 5);

        let summary = log.summary();
        assert_eq!(summary.total_queries, 2);
        assert_eq!(summary.total_tokens, 15);
        assert_eq!(summary.average_tokens_per_query, 7.5);
        assert_eq!(summary.capabilities_used_count["web_search"], 2);
        assert_eq!(summary.capabilities_used_count["read_file"], 1);
        assert!(summary.session_start.is_some());

        assert_eq!(
            log.memory_context(),
            "Q: a | Tools: web_search, web_search || Q: b | Tools: read_file"
        );
    }

    #[test]
    fn test_context_usage() {
        let messages = vec![Message::user("x".repeat(400))];
        let usage = ContextUsage::estimate(&messages, 8192);
        assert!(usage.estimated_tokens >= 100);
        assert!(usage.remaining_tokens < 8192);
        assert!(usage.usage_percent > 0.0);
    }
}
