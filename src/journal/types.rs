//! Decision record and its enums (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Pending,
    Successful,
    Revised,
    Abandoned,
}

impl Default for DecisionOutcome {
    fn default() -> Self {
        DecisionOutcome::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Architecture,
    Implementation,
    Naming,
    Tooling,
    Process,
    Bugfix,
    Refactor,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Active,
    Superseded,
    Retracted,
}

impl Default for DecisionStatus {
    fn default() -> Self {
        DecisionStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub decision: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub outcome: DecisionOutcome,
    #[serde(rename = "type")]
    pub decision_type: DecisionType,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lesson_learned: Option<String>,
    #[serde(default)]
    pub related_decisions: Vec<String>,
    #[serde(default)]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub status: DecisionStatus,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub spec_quality: f64,
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
}

fn schema_version_default() -> u32 {
    1
}

/// User-supplied fields for `record()`; the rest (`id`, `timestamp`,
/// `entities`, `spec_quality`, `status`) are derived at write time.
#[derive(Debug, Clone, Default)]
pub struct NewDecision {
    pub decision: String,
    pub rationale: String,
    pub alternatives: Vec<String>,
    pub decision_type: Option<DecisionType>,
    pub tags: Vec<String>,
    pub lesson_learned: Option<String>,
    pub related_decisions: Vec<String>,
    pub git_commit: Option<String>,
    pub session_id: Option<String>,
}

/// First-match-wins keyword table for auto-detecting a decision's type.
const TYPE_KEYWORDS: &[(&str, DecisionType)] = &[
    ("architecture", DecisionType::Architecture),
    ("naming", DecisionType::Naming),
    ("rename", DecisionType::Naming),
    ("test", DecisionType::Implementation),
    ("deploy", DecisionType::Tooling),
    ("tool", DecisionType::Tooling),
    ("ci", DecisionType::Tooling),
    ("process", DecisionType::Process),
    ("workflow", DecisionType::Process),
    ("bug", DecisionType::Bugfix),
    ("fix", DecisionType::Bugfix),
    ("refactor", DecisionType::Refactor),
];

pub fn detect_type(text: &str) -> DecisionType {
    let lower = text.to_lowercase();
    for (kw, ty) in TYPE_KEYWORDS {
        if lower.contains(kw) {
            return *ty;
        }
    }
    DecisionType::Other
}
