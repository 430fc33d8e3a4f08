//! Typed knowledge graph (spec.md §4.5): one JSON document, atomic replace
//! on every mutation.

pub mod query;
pub mod types;

use crate::error::{Error, Result};
use crate::journal::{DecisionStatus, JournalStore};
use crate::store::lock::ExclusiveLock;
use crate::store::{fs as storefs, Paths};
pub use query::SearchHit;
use serde_json::Value;
use std::collections::HashMap;
pub use types::{node_id, Edge, EdgeStatus, GraphDocument, Node, NodeType, Relation};

pub struct GraphStore {
    paths: Paths,
}

impl GraphStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    fn read(&self) -> Result<GraphDocument> {
        storefs::read_json(&self.paths.graph_file())
    }

    fn write(&self, doc: &GraphDocument) -> Result<()> {
        storefs::atomic_write_json(&self.paths.graph_file(), doc)
    }

    /// Insert or deep-merge-update a node. Re-adding an existing
    /// `(type,name)` pair merges `data` (new keys win) and bumps
    /// `updated_at` rather than creating a duplicate.
    pub fn add(&self, node_type: NodeType, name: &str, data: HashMap<String, Value>) -> Result<Node> {
        let _lock = ExclusiveLock::acquire(&self.paths.graph_file())?;
        let mut doc = self.read()?;
        let id = node_id(node_type, name);
        let now = crate::ids::now();
        let node = doc
            .nodes
            .entry(id.clone())
            .and_modify(|existing| {
                existing.data.extend(data.clone());
                existing.updated_at = now;
            })
            .or_insert_with(|| Node {
                id: id.clone(),
                node_type,
                name: name.to_string(),
                data,
                created_at: now,
                updated_at: now,
            })
            .clone();
        self.write(&doc)?;
        tracing::debug!(id = %node.id, "added graph node");
        Ok(node)
    }

    pub fn get(&self, id: &str) -> Result<Node> {
        self.read()?.nodes.get(id).cloned().ok_or_else(|| Error::NotFound { kind: "node", id: id.to_string() })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Node>> {
        Ok(self.read()?.nodes.into_values().find(|n| n.name == name))
    }

    pub fn list_by_type(&self, node_type: NodeType) -> Result<Vec<Node>> {
        Ok(self.read()?.nodes.into_values().filter(|n| n.node_type == node_type).collect())
    }

    /// Removes the node and every edge incident to it.
    pub fn delete(&self, id: &str) -> Result<()> {
        let _lock = ExclusiveLock::acquire(&self.paths.graph_file())?;
        let mut doc = self.read()?;
        if doc.nodes.remove(id).is_none() {
            return Err(Error::NotFound { kind: "node", id: id.to_string() });
        }
        doc.edges.retain(|e| e.from != id && e.to != id);
        self.write(&doc)
    }

    /// Upsert by `(from,to,relation)`: updates `weight` if the edge already
    /// exists, else inserts it active. Runs the `supersedes`/`contradicts`
    /// side effects named in spec.md §3. `journal` is consulted/mutated for
    /// `supersedes` only when the target node carries a `journal_id`.
    pub fn add_edge(
        &self,
        from: &str,
        to: &str,
        relation: Relation,
        weight: f64,
        bidirectional: bool,
        journal: Option<&JournalStore>,
    ) -> Result<Edge> {
        let _lock = ExclusiveLock::acquire(&self.paths.graph_file())?;
        let mut doc = self.read()?;
        if !doc.nodes.contains_key(from) {
            return Err(Error::NotFound { kind: "node", id: from.to_string() });
        }
        if !doc.nodes.contains_key(to) {
            return Err(Error::NotFound { kind: "node", id: to.to_string() });
        }

        let edge = upsert_edge(&mut doc, from, to, relation, weight, EdgeStatus::Active);
        if bidirectional {
            upsert_edge(&mut doc, to, from, relation, weight, EdgeStatus::Active);
        }
        self.write(&doc)?;

        if relation == Relation::Supersedes {
            if let Some(journal) = journal {
                apply_supersedes(&doc, journal, from, to)?;
            }
        }
        if relation == Relation::Contradicts {
            tracing::warn!(from, to, "contradicts edge recorded");
        }

        tracing::debug!(from, to, relation = ?relation, "added graph edge");
        Ok(edge)
    }

    pub fn delete_edge(&self, from: &str, to: &str, relation: Option<Relation>) -> Result<usize> {
        let _lock = ExclusiveLock::acquire(&self.paths.graph_file())?;
        let mut doc = self.read()?;
        let before = doc.edges.len();
        doc.edges.retain(|e| {
            !(e.from == from && e.to == to && relation.map(|r| r == e.relation).unwrap_or(true))
        });
        let removed = before - doc.edges.len();
        self.write(&doc)?;
        Ok(removed)
    }

    pub fn deprecate_edge(&self, from: &str, to: &str, relation: Relation) -> Result<()> {
        let _lock = ExclusiveLock::acquire(&self.paths.graph_file())?;
        let mut doc = self.read()?;
        let mut found = false;
        for e in doc.edges.iter_mut() {
            if e.from == from && e.to == to && e.relation == relation {
                e.status = EdgeStatus::Deprecated;
                e.updated_at = crate::ids::now();
                found = true;
            }
        }
        if !found {
            return Err(Error::NotFound { kind: "edge", id: format!("{from}->{to}") });
        }
        self.write(&doc)
    }

    pub fn outgoing(&self, node: &str) -> Result<Vec<Edge>> {
        Ok(query::outgoing(&self.read()?, node).into_iter().cloned().collect())
    }

    pub fn incoming(&self, node: &str) -> Result<Vec<Edge>> {
        Ok(query::incoming(&self.read()?, node).into_iter().cloned().collect())
    }

    pub fn neighbors(&self, node: &str) -> Result<Vec<String>> {
        Ok(query::neighbors(&self.read()?, node))
    }

    pub fn bfs(&self, start: &str, max_depth: usize) -> Result<Vec<(String, usize)>> {
        Ok(query::bfs(&self.read()?, start, max_depth))
    }

    pub fn dfs(&self, start: &str, max_depth: usize) -> Result<Vec<(String, usize)>> {
        Ok(query::dfs(&self.read()?, start, max_depth))
    }

    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Option<Vec<String>>> {
        Ok(query::shortest_path(&self.read()?, from, to))
    }

    pub fn related(&self, start: &str, max_hops: usize) -> Result<Vec<(String, usize, String)>> {
        Ok(query::related(&self.read()?, start, max_hops))
    }

    pub fn clusters(&self) -> Result<Vec<Vec<String>>> {
        Ok(query::clusters(&self.read()?))
    }

    pub fn orphans(&self) -> Result<Vec<String>> {
        Ok(query::orphans(&self.read()?))
    }

    pub fn hubs(&self, limit: usize) -> Result<Vec<(String, usize)>> {
        Ok(query::hubs(&self.read()?, limit))
    }

    pub fn search(&self, query_text: &str) -> Result<Vec<SearchHit>> {
        Ok(query::search(&self.read()?, query_text))
    }

    /// Idempotent reconciliation: ensure every active decision in the
    /// journal has a corresponding `decision-*` node carrying
    /// `data.journal_id`. Re-running with no new decisions makes zero
    /// changes (spec.md §8).
    pub fn sync(&self, journal: &JournalStore) -> Result<usize> {
        let decisions = journal.list(&crate::journal::ListFilter::default())?;
        let mut created = 0;
        for decision in decisions {
            if decision.status == DecisionStatus::Retracted {
                continue;
            }
            let id = node_id(NodeType::Decision, &decision.decision);
            let existed = self.read()?.nodes.contains_key(&id);
            let mut data = HashMap::new();
            data.insert("journal_id".to_string(), Value::String(decision.id.clone()));
            self.add(NodeType::Decision, &decision.decision, data)?;
            if !existed {
                created += 1;
            }
        }
        tracing::info!(created, "graph sync complete");
        Ok(created)
    }
}

fn upsert_edge(
    doc: &mut GraphDocument,
    from: &str,
    to: &str,
    relation: Relation,
    weight: f64,
    status: EdgeStatus,
) -> Edge {
    let now = crate::ids::now();
    if let Some(existing) = doc.edges.iter_mut().find(|e| e.from == from && e.to == to && e.relation == relation) {
        existing.weight = weight;
        existing.updated_at = now;
        return existing.clone();
    }
    let edge = Edge {
        from: from.to_string(),
        to: to.to_string(),
        relation,
        weight,
        bidirectional: false,
        status,
        created_at: now,
        updated_at: now,
    };
    doc.edges.push(edge.clone());
    edge
}

/// Open Question #1 (SPEC_FULL.md §9): a `supersedes` edge targeting an
/// already-retracted decision leaves it unchanged — retraction is terminal.
fn apply_supersedes(doc: &GraphDocument, journal: &JournalStore, from: &str, to: &str) -> Result<()> {
    let target_journal_id = match doc.nodes.get(to).and_then(|n| n.data.get("journal_id")).and_then(|v| v.as_str()) {
        Some(id) => id.to_string(),
        None => return Ok(()),
    };
    let source_journal_id = doc.nodes.get(from).and_then(|n| n.data.get("journal_id")).and_then(|v| v.as_str()).map(str::to_string);

    let target = journal.get(&target_journal_id)?;
    if target.status == DecisionStatus::Retracted {
        return Ok(());
    }

    journal.update(&target_journal_id, |d| {
        d.status = DecisionStatus::Superseded;
        d.superseded_by = source_journal_id;
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::NewDecision;
    use tempfile::TempDir;

    fn stores(dir: &TempDir) -> (GraphStore, JournalStore) {
        (GraphStore::new(Paths::new(dir.path())), JournalStore::new(Paths::new(dir.path()), 0.70, 0.30))
    }

    #[test]
    fn add_node_is_deterministic_and_merges_on_re_add() {
        let dir = TempDir::new().unwrap();
        let (graph, _journal) = stores(&dir);
        let first = graph.add(NodeType::Project, "lore", HashMap::new()).unwrap();

        let mut data = HashMap::new();
        data.insert("lang".to_string(), Value::String("rust".into()));
        let second = graph.add(NodeType::Project, "lore", data).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(graph.list_by_type(NodeType::Project).unwrap().len(), 1);
        assert_eq!(second.data.get("lang").and_then(|v| v.as_str()), Some("rust"));
    }

    #[test]
    fn supersedes_edge_flips_target_status() {
        let dir = TempDir::new().unwrap();
        let (graph, journal) = stores(&dir);
        let a = journal.record(NewDecision { decision: "Use JSONL for A".into(), rationale: "x".into(), ..Default::default() }, false).unwrap();
        let b = journal.record(NewDecision { decision: "Use SQLite for B".into(), rationale: "y".into(), ..Default::default() }, false).unwrap();

        let mut a_data = HashMap::new();
        a_data.insert("journal_id".to_string(), Value::String(a.id.clone()));
        let a_node = graph.add(NodeType::Decision, &a.decision, a_data).unwrap();
        let mut b_data = HashMap::new();
        b_data.insert("journal_id".to_string(), Value::String(b.id.clone()));
        let b_node = graph.add(NodeType::Decision, &b.decision, b_data).unwrap();

        graph.add_edge(&a_node.id, &b_node.id, Relation::Supersedes, 1.0, false, Some(&journal)).unwrap();

        let updated = journal.get(&b.id).unwrap();
        assert_eq!(updated.status, DecisionStatus::Superseded);
        assert_eq!(updated.superseded_by, Some(a.id));
    }

    #[test]
    fn supersedes_leaves_a_retracted_target_unchanged() {
        let dir = TempDir::new().unwrap();
        let (graph, journal) = stores(&dir);
        let a = journal.record(NewDecision { decision: "Use JSONL for A".into(), rationale: "x".into(), ..Default::default() }, false).unwrap();
        let b = journal.record(NewDecision { decision: "Use SQLite for B".into(), rationale: "y".into(), ..Default::default() }, false).unwrap();
        journal.update(&b.id, |d| d.status = DecisionStatus::Retracted).unwrap();

        let mut a_data = HashMap::new();
        a_data.insert("journal_id".to_string(), Value::String(a.id.clone()));
        let a_node = graph.add(NodeType::Decision, &a.decision, a_data).unwrap();
        let mut b_data = HashMap::new();
        b_data.insert("journal_id".to_string(), Value::String(b.id.clone()));
        let b_node = graph.add(NodeType::Decision, &b.decision, b_data).unwrap();

        graph.add_edge(&a_node.id, &b_node.id, Relation::Supersedes, 1.0, false, Some(&journal)).unwrap();

        let updated = journal.get(&b.id).unwrap();
        assert_eq!(updated.status, DecisionStatus::Retracted);
        assert_eq!(updated.superseded_by, None);
    }

    #[test]
    fn sync_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let (graph, journal) = stores(&dir);
        journal.record(NewDecision { decision: "Adopt layered architecture".into(), rationale: "x".into(), ..Default::default() }, false).unwrap();
        let first = graph.sync(&journal).unwrap();
        let second = graph.sync(&journal).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }
}
