//! Reflection on a capability result.
//!
//! When enabled, the agent asks the model to judge each capability call
//! against the goal it is working on. A reply that does not decode falls
//! back to a verdict inferred from the result itself.

use crate::parser::json_object_span;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The model's judgement of one capability call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    /// Whether the call moved the task forward
    pub success: bool,
    /// Score in `0.0..=1.0`
    #[serde(default = "default_effectiveness")]
    pub effectiveness: f64,
    /// Why it worked or didn't
    #[serde(default)]
    pub reasoning: String,
    /// Suggested next move
    #[serde(default)]
    pub next_action: String,
    /// Whether the same call should be tried again
    #[serde(default)]
    pub should_retry: bool,
    /// Different strategy when the call did not help
    #[serde(default)]
    pub alternative_approach: String,
}

fn default_effectiveness() -> f64 {
    0.5
}

impl Critique {
    /// Verdict used when the model's critique cannot be decoded: the call
    /// counts as successful unless its result mentions an error
    #[must_use]
    pub fn fallback(result: &Value) -> Self {
        Self {
            success: !result.to_string().to_lowercase().contains("error"),
            effectiveness: default_effectiveness(),
            reasoning: "Unable to evaluate".to_string(),
            next_action: "Continue".to_string(),
            should_retry: false,
            alternative_approach: "None".to_string(),
        }
    }
}

/// Prompt asking the model to evaluate `action` and its `result`
#[must_use]
pub fn critique_prompt(goal: &str, action: &str, result: &Value) -> String {
    let rendered = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
    format!(
        r#"Evaluate this action and its result:

Goal: {goal}
Action Taken: {action}
Result: {rendered}

Respond with JSON:
{{
    "success": true/false,
    "effectiveness": 0.8,
    "reasoning": "Why this worked or didn't work",
    "next_action": "What to do next",
    "should_retry": true/false,
    "alternative_approach": "Different strategy if this didn't work"
}}"#
    )
}

/// Decode a critique reply, falling back to [`Critique::fallback`]
#[must_use]
pub fn parse_critique(reply: &str, result: &Value) -> Critique {
    json_object_span(reply)
        .and_then(|span| serde_json::from_str::<Critique>(span).ok())
        .map(|mut critique| {
            critique.effectiveness = critique.effectiveness.clamp(0.0, 1.0);
            critique
        })
        .unwrap_or_else(|| Critique::fallback(result))
}
