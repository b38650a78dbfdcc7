//! Agents - Per-worker reasoning loop
//!
//! - `critique`: optional reflection on capability results
//! - `history`: bounded prompt history
//! - `session`: turn log and session analytics
//! - `worker`: the `Worker` trait and `AgentReply`
//! - `reasoning`: `Agent`, the think/act/observe loop over a model backend

mod critique;
mod history;
mod reasoning;
mod session;
mod worker;

pub use critique::{critique_prompt, parse_critique, Critique};
pub use history::{ConversationHistory, DEFAULT_HISTORY_WINDOW};
pub use reasoning::{Agent, AgentConfig, ITERATION_LIMIT_MESSAGE};
pub use session::{
    ContextUsage, ConversationTurn, SessionSummary, TurnLog, RESPONSE_PREVIEW_CHARS,
    TURN_LOG_CAPACITY,
};
pub use worker::{AgentReply, Worker};

#[cfg(test)]
pub use worker::MockWorker;
