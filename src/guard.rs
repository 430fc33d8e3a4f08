//! Dedup/contradiction guard (spec.md §4.2, §4.5). The dedup half is
//! inlined at each store's write path (`JournalStore::record`,
//! `PatternStore::capture`) since it is a pre-write rejection specific to
//! each store's own records; this module holds the part that is
//! genuinely shared across stores — the Jaccard threshold check itself,
//! reused by tests and callers that want to pre-flight a write — and the
//! cross-store contradiction scan, which needs both the journal and the
//! graph.

use crate::error::Result;
use crate::graph::{GraphStore, NodeType, Relation};
use crate::journal::{Decision, DecisionStatus, JournalStore};
use crate::text;

/// `true` if `candidate` is a near-duplicate of `existing` at `threshold`.
pub fn is_duplicate(existing: &str, candidate: &str, threshold: f64) -> bool {
    text::jaccard(existing, candidate) >= threshold
}

#[derive(Debug, Clone)]
pub struct ContradictionHit {
    pub decision_id: String,
    pub other_id: String,
    pub shared_entities: Vec<String>,
    pub similarity: f64,
}

/// Advisory-only: a candidate pair with `>=2` shared entities but
/// similarity below `threshold` reads as two decisions about the same
/// things that disagree. Never blocks a write; when both decisions are
/// already graph nodes, records a bidirectional `contradicts` edge.
pub fn contradiction_scan(journal: &JournalStore, graph: &GraphStore, decision: &Decision, threshold: f64) -> Result<Vec<ContradictionHit>> {
    let mut hits = Vec::new();
    let candidates = journal.list(&crate::journal::ListFilter::default())?;
    for other in &candidates {
        if other.id == decision.id || other.status == DecisionStatus::Retracted {
            continue;
        }
        let shared: Vec<String> = decision.entities.iter().filter(|e| other.entities.contains(e)).cloned().collect();
        if shared.len() < 2 {
            continue;
        }
        let similarity = text::jaccard(&decision.decision, &other.decision);
        if similarity >= threshold {
            continue;
        }
        tracing::warn!(a = %decision.id, b = %other.id, shared = shared.len(), "possible contradiction");

        if let (Ok(Some(a_node)), Ok(Some(b_node))) = (graph.find_by_name(&decision.decision), graph.find_by_name(&other.decision)) {
            let _ = graph.add_edge(&a_node.id, &b_node.id, Relation::Contradicts, 1.0, true, None);
        }

        hits.push(ContradictionHit { decision_id: decision.id.clone(), other_id: other.id.clone(), shared_entities: shared, similarity });
    }
    Ok(hits)
}

/// Ensures both decisions exist as `decision-*` graph nodes before a
/// contradiction edge is recorded between them; used when the decisions
/// predate `GraphStore::sync`.
pub fn ensure_decision_node(graph: &GraphStore, decision: &Decision) -> Result<()> {
    let mut data = std::collections::HashMap::new();
    data.insert("journal_id".to_string(), serde_json::Value::String(decision.id.clone()));
    graph.add(NodeType::Decision, &decision.decision, data)?;
    Ok(())
}
