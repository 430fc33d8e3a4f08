//! Thin façade over the search index and graph store (spec.md §4.9): picks
//! a retrieval mode, fails open when the embedding provider or the index is
//! unusable, and (graph mode) expands a base ranked set by BFS.

use crate::embedding::Provider;
use crate::error::Result;
use crate::graph::{GraphStore, Relation};
use crate::journal::JournalStore;
use crate::pattern_store::PatternStore;
use crate::search::{SearchHit, SearchIndex};
use crate::store::Paths;
use crate::transfer::TransferEngine;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fts,
    Semantic,
    Hybrid,
    Graph,
}

#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    pub text: String,
    pub mode: Mode,
    pub project: Option<String>,
    pub limit: usize,
    pub compact: bool,
    pub depth: usize,
    pub edges: Option<Vec<Relation>>,
}

impl Default for RetrievalQuery {
    fn default() -> Self {
        Self { text: String::new(), mode: Mode::Fts, project: None, limit: 10, compact: false, depth: 2, edges: None }
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub hits: Vec<SearchHit>,
    pub degraded: bool,
}

/// Bundles the stores retrieval needs without `RetrievalEngine` owning
/// them; `Engine` owns the stores and constructs this per call.
pub struct Sources<'a> {
    pub journal: &'a JournalStore,
    pub patterns: &'a PatternStore,
    pub transfer: &'a TransferEngine,
    pub graph: &'a GraphStore,
    pub embedder: &'a dyn Provider,
    pub paths: &'a Paths,
}

pub struct RetrievalEngine;

impl RetrievalEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn search(&self, index: &mut SearchIndex, sources: &Sources, query: &RetrievalQuery) -> Result<RetrievalResult> {
        let mut degraded = false;

        let lexical_only = self.lexical_hits(index, sources, query)?;
        if lexical_only.is_empty() && query.mode != Mode::Fts {
            index.build(sources.journal, sources.patterns, sources.transfer, sources.graph, sources.embedder)?;
        }

        let hits = match query.mode {
            Mode::Fts => self.lexical_hits(index, sources, query)?,
            Mode::Semantic => match sources.embedder.embed(&query.text) {
                Ok(vec) => index.search_semantic(&vec, query.limit)?,
                Err(_) => {
                    degraded = true;
                    self.lexical_hits(index, sources, query)?
                }
            },
            Mode::Hybrid => match sources.embedder.embed(&query.text) {
                Ok(vec) => index.search_hybrid(&query.text, Some(&vec), query.project.as_deref(), query.limit)?,
                Err(_) => {
                    degraded = true;
                    index.search_hybrid(&query.text, None, query.project.as_deref(), query.limit)?
                }
            },
            Mode::Graph => self.graph_expanded(index, sources, query)?,
        };

        Ok(RetrievalResult { hits, degraded })
    }

    fn lexical_hits(&self, index: &SearchIndex, _sources: &Sources, query: &RetrievalQuery) -> Result<Vec<SearchHit>> {
        index.search_lexical_all(&query.text, query.project.as_deref(), query.limit)
    }

    /// Open Question #3 resolution (SPEC_FULL.md §9): direct-match scores
    /// always take precedence over graph-derived scores for the same
    /// record; a node reachable via multiple paths keeps only its
    /// highest-scoring path.
    fn graph_expanded(&self, index: &mut SearchIndex, sources: &Sources, query: &RetrievalQuery) -> Result<Vec<SearchHit>> {
        let base = self.lexical_hits(index, sources, query)?;
        let depth = query.depth.min(3);

        let mut seed_ids: Vec<String> = Vec::new();
        for hit in sources.graph.search(&query.text)? {
            seed_ids.push(hit.node_id);
        }

        let mut expanded: HashMap<String, f64> = HashMap::new();
        for seed in &seed_ids {
            for (node_id, hop, relation) in sources.graph.related(seed, depth)? {
                if let Some(allowlist) = &query.edges {
                    if !allowlist.iter().any(|r| format!("{r:?}") == relation) {
                        continue;
                    }
                }
                let edge_weight = relation_weight(&relation);
                let score = edge_weight * 0.7_f64.powi(hop as i32);
                expanded.entry(node_id).and_modify(|s| {
                    if score > *s {
                        *s = score;
                    }
                }).or_insert(score);
            }
        }

        let mut direct_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut merged = base;
        for hit in &merged {
            direct_ids.insert(hit.record_id.clone());
        }
        for (node_id, score) in expanded {
            if direct_ids.contains(&node_id) {
                continue;
            }
            if let Ok(node) = sources.graph.get(&node_id) {
                merged.push(SearchHit {
                    record_type: "graph_node".to_string(),
                    record_id: node.id,
                    content_prefix: node.name.chars().take(120).collect(),
                    project: None,
                    timestamp: node.updated_at,
                    score,
                });
            }
        }
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        merged.truncate(query.limit);
        Ok(merged)
    }
}

impl Default for RetrievalEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed edge-type relevance table (spec.md §4.8), in `[0.4, 1.0]`.
fn relation_weight(relation_debug: &str) -> f64 {
    match relation_debug {
        "Supersedes" => 1.0,
        "Contradicts" => 0.9,
        "Implements" => 0.85,
        "DependsOn" => 0.8,
        "Affects" => 0.75,
        "LearnedFrom" => 0.7,
        "Produces" | "Consumes" => 0.65,
        "RelatesTo" => 0.6,
        "Contains" | "PartOf" => 0.6,
        "References" | "Grounds" | "Informs" => 0.55,
        "DerivedFrom" | "SummarizedBy" | "Yields" | "Hosts" => 0.5,
        _ => 0.4,
    }
}

/// One fixed-width line per result: `[type] id | title(<=40) | project |
/// date | score` (spec.md §4.8 compact output).
pub fn render_compact(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| {
            let title: String = h.content_prefix.chars().take(40).collect();
            format!(
                "[{}] {} | {:<40} | {} | {} | {:.3}",
                h.record_type,
                h.record_id,
                title,
                h.project.as_deref().unwrap_or("-"),
                h.timestamp.format("%Y-%m-%d"),
                h.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
