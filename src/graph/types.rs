//! Graph node/edge types (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Concept,
    File,
    Pattern,
    Lesson,
    Decision,
    Session,
    Project,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Concept => "concept",
            NodeType::File => "file",
            NodeType::Pattern => "pattern",
            NodeType::Lesson => "lesson",
            NodeType::Decision => "decision",
            NodeType::Session => "session",
            NodeType::Project => "project",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    #[serde(default)]
    pub data: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fixed relation vocabulary (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    RelatesTo,
    LearnedFrom,
    Affects,
    Supersedes,
    Contradicts,
    Contains,
    References,
    Implements,
    DependsOn,
    Produces,
    Consumes,
    DerivedFrom,
    PartOf,
    SummarizedBy,
    Yields,
    Informs,
    Grounds,
    Hosts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    Active,
    Deprecated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub relation: Relation,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default = "default_status")]
    pub status: EdgeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_status() -> EdgeStatus {
    EdgeStatus::Active
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// `type-hex(md5(name))[0..8]` (spec.md §6). The one deterministic ID format
/// in the crate, since it must be a pure function of (type, name).
pub fn node_id(node_type: NodeType, name: &str) -> String {
    let digest = md5::compute(name.as_bytes());
    format!("{}-{}", node_type.as_str(), &hex::encode(digest.0)[0..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_a_pure_function_of_type_and_name() {
        let a = node_id(NodeType::Project, "lore");
        let b = node_id(NodeType::Project, "lore");
        assert_eq!(a, b);
        assert!(a.starts_with("project-"));
        assert_eq!(a.len(), "project-".len() + 8);
    }

    #[test]
    fn different_names_yield_different_ids() {
        assert_ne!(node_id(NodeType::Concept, "a"), node_id(NodeType::Concept, "b"));
    }
}
