//! Goal and spec-import types (spec.md §3, §4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Draft,
    Active,
    Blocked,
    Completed,
    Cancelled,
}

impl Default for GoalStatus {
    fn default() -> Self {
        GoalStatus::Draft
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for CriterionStatus {
    fn default() -> Self {
        CriterionStatus::Pending
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuccessCriterion {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: CriterionStatus,
    #[serde(default)]
    pub acceptance: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Specify,
    Plan,
    Tasks,
    Implement,
    Complete,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Specify
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub assigned_session: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan_decisions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub path: String,
    #[serde(default)]
    pub branch: Option<String>,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    Failed,
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalOutcome {
    pub status: OutcomeStatus,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub journal_entry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub success_criteria: Vec<SuccessCriterion>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: Option<GoalSource>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub outcome: Option<GoalOutcome>,
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
}

fn schema_version_default() -> u32 {
    1
}

#[derive(Debug, Clone, Default)]
pub struct NewGoal {
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
    pub projects: Vec<String>,
    pub tags: Vec<String>,
}

/// The out-of-scope markdown parser's output: an opaque input this crate
/// only consumes (spec.md §1, §4.7).
#[derive(Debug, Clone, Default)]
pub struct ImportedUserStory {
    pub description: String,
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportedPlanDecision {
    pub decision: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportedSpec {
    pub title: String,
    pub path: String,
    pub branch: Option<String>,
    pub user_stories: Vec<ImportedUserStory>,
    pub plan_decisions: Vec<ImportedPlanDecision>,
}
