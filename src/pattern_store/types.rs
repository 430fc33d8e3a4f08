//! Pattern and anti-pattern records (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bash,
    Git,
    Testing,
    Architecture,
    Naming,
    Security,
    Docker,
    Api,
    Performance,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternExamples {
    #[serde(default)]
    pub bad: Option<String>,
    #[serde(default)]
    pub good: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub context: String,
    pub problem: String,
    pub solution: String,
    pub category: Category,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub validations: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub spec_quality: f64,
    #[serde(default)]
    pub examples: Option<PatternExamples>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
}

fn default_confidence() -> f64 {
    0.5
}

fn schema_version_default() -> u32 {
    1
}

impl Pattern {
    /// §4.3: stale when under-validated or under-confident.
    pub fn is_stale(&self) -> bool {
        self.confidence < 0.3 || self.validations == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiPattern {
    pub id: String,
    pub name: String,
    pub symptom: String,
    pub risk: String,
    pub fix: String,
    pub category: Category,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternDocument {
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub anti_patterns: Vec<AntiPattern>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPattern {
    pub name: String,
    pub context: String,
    pub problem: String,
    pub solution: String,
    pub category: Option<Category>,
    pub origin: Option<String>,
    pub examples: Option<PatternExamples>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAntiPattern {
    pub name: String,
    pub symptom: String,
    pub risk: String,
    pub fix: String,
    pub category: Option<Category>,
    pub severity: Severity,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::General
    }
}
