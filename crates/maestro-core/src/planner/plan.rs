//! Plan and step types, including the wire form the planner model emits.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Worker the degraded plan assigns the whole task to
pub const FALLBACK_WORKER: &str = "researcher";

/// One unit of plan work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier, unique within the plan but not necessarily sequential
    pub id: u32,
    /// Worker name
    #[serde(rename = "agent", alias = "worker")]
    pub worker: String,
    /// Free-text instruction
    pub action: String,
    /// Ids whose results must exist before this step runs
    #[serde(default)]
    pub dependencies: Vec<u32>,
    /// What the step should produce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

impl Step {
    /// Create a step with no dependencies
    #[must_use]
    pub fn new(id: u32, worker: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id,
            worker: worker.into(),
            action: action.into(),
            dependencies: Vec::new(),
            expected_output: None,
        }
    }

    /// Set dependencies
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = u32>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Set the expected output description
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }
}

/// Ordered steps plus the planner's rationale
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Steps in execution (list) order
    pub steps: Vec<Step>,
    /// Why the plan looks the way it does
    #[serde(default)]
    pub rationale: String,
}

/// Structural problem found by [`Plan::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanIssue {
    /// A step lists itself as a dependency
    SelfDependency(u32),
    /// Two steps share an id
    DuplicateId(u32),
    /// A dependency names an id that is not in the plan
    UnknownDependency {
        /// Step declaring the dependency
        step: u32,
        /// Missing id
        dependency: u32,
    },
    /// A dependency appears later in the list than the step needing it
    ForwardDependency {
        /// Step declaring the dependency
        step: u32,
        /// Id listed after it
        dependency: u32,
    },
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanIssue::SelfDependency(id) => write!(f, "step {} depends on itself", id),
            PlanIssue::DuplicateId(id) => write!(f, "step id {} is used more than once", id),
            PlanIssue::UnknownDependency { step, dependency } => {
                write!(f, "step {} depends on unknown step {}", step, dependency)
            }
            PlanIssue::ForwardDependency { step, dependency } => write!(
                f,
                "step {} depends on step {} which is listed after it",
                step, dependency
            ),
        }
    }
}

impl Plan {
    /// Create a plan
    #[must_use]
    pub fn new(steps: Vec<Step>, rationale: impl Into<String>) -> Self {
        Self {
            steps,
            rationale: rationale.into(),
        }
    }

    /// Single-step plan handing the whole task to the researcher
    #[must_use]
    pub fn fallback(task: &str, reason: impl fmt::Display) -> Self {
        Self {
            steps: vec![Step::new(1, FALLBACK_WORKER, task).with_expected_output("Results")],
            rationale: format!("Fallback plan due to parsing error: {}", reason),
        }
    }

    /// Whether this is a degraded fallback plan
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.rationale.starts_with("Fallback plan due to parsing error:")
    }

    /// Look up a step by id
    #[must_use]
    pub fn step(&self, id: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Report structural problems without rejecting the plan
    #[must_use]
    pub fn validate(&self) -> Vec<PlanIssue> {
        let mut issues = Vec::new();
        let all_ids: HashSet<u32> = self.steps.iter().map(|s| s.id).collect();
        let mut seen = HashSet::new();

        for step in &self.steps {
            if !seen.insert(step.id) {
                issues.push(PlanIssue::DuplicateId(step.id));
            }
            for &dependency in &step.dependencies {
                if dependency == step.id {
                    issues.push(PlanIssue::SelfDependency(step.id));
                } else if !all_ids.contains(&dependency) {
                    issues.push(PlanIssue::UnknownDependency {
                        step: step.id,
                        dependency,
                    });
                } else if !seen.contains(&dependency) {
                    issues.push(PlanIssue::ForwardDependency {
                        step: step.id,
                        dependency,
                    });
                }
            }
        }

        issues
    }
}
