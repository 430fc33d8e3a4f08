//! Topic briefing (spec.md §4.13), the subtraction check (§4.14), and
//! hook-callable auto-context injection (§4.15) — the three cross-store
//! reads that compose the other components directly rather than going
//! through the search index.

use crate::error::Result;
use crate::failure::FailureStore;
use crate::graph::GraphStore;
use crate::guard::{self, ContradictionHit};
use crate::journal::{DecisionStatus, JournalStore};
use crate::pattern_store::PatternStore;
use crate::retrieval::{render_compact, Mode, RetrievalEngine, RetrievalQuery, Sources};
use crate::search::SearchIndex;
use crate::text;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DecisionBrief {
    pub id: String,
    pub age_days: i64,
    pub spec_quality: f64,
    pub outcome: String,
    pub decision: String,
}

#[derive(Debug, Clone)]
pub struct PatternBrief {
    pub id: String,
    pub name: String,
    pub confidence: f64,
    pub stale: bool,
}

#[derive(Debug, Clone)]
pub struct FailureBrief {
    pub error_type: String,
    pub count: usize,
    pub promotion_candidate: bool,
}

#[derive(Debug, Clone)]
pub struct GraphEdgeBrief {
    pub from: String,
    pub relation: String,
    pub to: String,
}

#[derive(Debug, Clone, Default)]
pub struct Briefing {
    pub topic: String,
    pub decisions: Vec<DecisionBrief>,
    pub patterns: Vec<PatternBrief>,
    pub failures: Vec<FailureBrief>,
    pub graph_edges: Vec<GraphEdgeBrief>,
    pub contradictions: Vec<ContradictionHit>,
}

/// Topic-scoped, cross-component read (spec.md §4.13). Never mutates.
pub fn brief(topic: &str, journal: &JournalStore, patterns: &PatternStore, failures: &FailureStore, graph: &GraphStore) -> Result<Briefing> {
    let needle = topic.to_lowercase();
    let now = crate::ids::now();

    let matched_decisions: Vec<_> = journal
        .list(&crate::journal::ListFilter::default())?
        .into_iter()
        .filter(|d| d.status == DecisionStatus::Active)
        .filter(|d| {
            d.decision.to_lowercase().contains(&needle)
                || d.rationale.to_lowercase().contains(&needle)
                || d.entities.iter().any(|e| e.to_lowercase().contains(&needle))
                || d.tags.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .collect();

    let mut contradictions = Vec::new();
    for decision in &matched_decisions {
        let hits = guard::contradiction_scan(journal, graph, decision, journal.contradiction_threshold())?;
        for hit in hits {
            if matched_decisions.iter().any(|d| d.id == hit.other_id) {
                contradictions.push(hit);
            }
        }
    }

    let decisions = matched_decisions
        .iter()
        .map(|d| DecisionBrief {
            id: d.id.clone(),
            age_days: (now - d.timestamp).num_days(),
            spec_quality: d.spec_quality,
            outcome: format!("{:?}", d.outcome),
            decision: d.decision.clone(),
        })
        .collect();

    let pattern_matches: Vec<_> = patterns
        .list(None)?
        .into_iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.context.to_lowercase().contains(&needle)
                || p.solution.to_lowercase().contains(&needle)
                || p.problem.to_lowercase().contains(&needle)
        })
        .map(|p| PatternBrief { id: p.id, name: p.name, confidence: p.confidence, stale: p.confidence < 0.3 })
        .collect();

    let anti_patterns = patterns.list_anti_patterns()?;
    let mut failure_counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for f in failures.list(&crate::failure::ListFilter::default())? {
        if f.error_type.to_lowercase().contains(&needle) || f.error_message.to_lowercase().contains(&needle) {
            *failure_counts.entry(f.error_type).or_insert(0) += 1;
        }
    }
    let failure_briefs = failure_counts
        .into_iter()
        .map(|(error_type, count)| {
            let promotion_candidate = count >= 3 && !anti_patterns.iter().any(|a| a.name.to_lowercase().contains(&error_type.to_lowercase()));
            FailureBrief { error_type, count, promotion_candidate }
        })
        .collect();

    let mut graph_edges = Vec::new();
    for hit in graph.search(topic)? {
        for edge in graph.outgoing(&hit.node_id)? {
            graph_edges.push(GraphEdgeBrief { from: hit.node_id.clone(), relation: format!("{:?}", edge.relation), to: edge.to.clone() });
        }
    }

    Ok(Briefing { topic: topic.to_string(), decisions, patterns: pattern_matches, failures: failure_briefs, graph_edges, contradictions })
}

/// Structured Markdown suitable for agent consumption (spec.md §4.13).
pub fn render_markdown(briefing: &Briefing) -> String {
    let mut out = format!("# Brief: {}\n\n", briefing.topic);

    out.push_str("## Decisions\n");
    if briefing.decisions.is_empty() {
        out.push_str("_none_\n");
    }
    for d in &briefing.decisions {
        out.push_str(&format!(
            "- `{}` ({}d old, quality {:.2}, outcome {}): {}\n",
            d.id, d.age_days, d.spec_quality, d.outcome, d.decision
        ));
    }
    if !briefing.contradictions.is_empty() {
        out.push_str("\n**Contradictions:**\n");
        for c in &briefing.contradictions {
            out.push_str(&format!("- `{}` vs `{}` (similarity {:.2}, {} shared entities)\n", c.decision_id, c.other_id, c.similarity, c.shared_entities.len()));
        }
    }

    out.push_str("\n## Patterns\n");
    if briefing.patterns.is_empty() {
        out.push_str("_none_\n");
    }
    for p in &briefing.patterns {
        let stale = if p.stale { " (stale)" } else { "" };
        out.push_str(&format!("- `{}` {} confidence {:.2}{}\n", p.id, p.name, p.confidence, stale));
    }

    out.push_str("\n## Failures\n");
    if briefing.failures.is_empty() {
        out.push_str("_none_\n");
    }
    for f in &briefing.failures {
        let promo = if f.promotion_candidate { " — eligible for anti-pattern promotion" } else { "" };
        out.push_str(&format!("- {} x{}{}\n", f.error_type, f.count, promo));
    }

    out.push_str("\n## Graph\n");
    if briefing.graph_edges.is_empty() {
        out.push_str("_none_\n");
    }
    for e in &briefing.graph_edges {
        out.push_str(&format!("- {} → {} → {}\n", e.from, e.relation, e.to));
    }

    out
}

#[derive(Debug, Clone, Default)]
pub struct SubtractionReport {
    pub contradiction_pairs: usize,
    pub stale_pending_decisions: usize,
    pub low_confidence_unvalidated_patterns: usize,
    pub deprecated_patterns_without_replacement: usize,
}

impl SubtractionReport {
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("{} decision contradiction(s)", self.contradiction_pairs),
            format!("{} pending decision(s) older than threshold", self.stale_pending_decisions),
            format!("{} low-confidence pattern(s) with zero validations", self.low_confidence_unvalidated_patterns),
            format!("{} deprecated pattern(s) with no replacement anti-pattern", self.deprecated_patterns_without_replacement),
        ]
    }
}

/// Advisory read-time checks invoked by resume (spec.md §4.14).
pub fn subtraction_check(journal: &JournalStore, patterns: &PatternStore, graph: &GraphStore, pending_days: u32) -> Result<SubtractionReport> {
    let active = journal
        .list(&crate::journal::ListFilter::default())?
        .into_iter()
        .filter(|d| d.status == DecisionStatus::Active)
        .collect::<Vec<_>>();

    let mut seen_pairs = std::collections::HashSet::new();
    let mut contradiction_pairs = 0;
    for decision in &active {
        for hit in guard::contradiction_scan(journal, graph, decision, journal.contradiction_threshold())? {
            let mut key = [decision.id.clone(), hit.other_id.clone()];
            key.sort();
            if seen_pairs.insert(key) {
                contradiction_pairs += 1;
            }
        }
    }

    let now = crate::ids::now();
    let cutoff_days = chrono::Duration::days(pending_days as i64);
    let stale_pending_decisions = active
        .iter()
        .filter(|d| d.outcome == crate::journal::DecisionOutcome::Pending && (now - d.timestamp) > cutoff_days)
        .count();

    let all_patterns = patterns.list(None)?;
    let low_confidence_unvalidated_patterns = all_patterns.iter().filter(|p| !p.deprecated && p.confidence < 0.3 && p.validations == 0).count();

    let anti_patterns = patterns.list_anti_patterns()?;
    let deprecated_patterns_without_replacement = all_patterns
        .iter()
        .filter(|p| p.deprecated)
        .filter(|p| !anti_patterns.iter().any(|a| text::jaccard(&a.name, &p.name) >= 0.3))
        .count();

    Ok(SubtractionReport { contradiction_pairs, stale_pending_decisions, low_confidence_unvalidated_patterns, deprecated_patterns_without_replacement })
}

/// Derives a project tag for [`inject`] by walking up from `cwd` looking for
/// a `.lore/project.yaml` marker. Falls back to `None`.
fn derive_project_tag(cwd: &Path) -> Option<String> {
    let mut dir = Some(cwd);
    while let Some(d) = dir {
        let marker = d.join(crate::store::Paths::new(".").project_marker());
        if marker.exists() {
            let text = std::fs::read_to_string(&marker).ok()?;
            let value: serde_yaml::Value = serde_yaml::from_str(&text).ok()?;
            return value.get("project").and_then(|v| v.as_str()).map(str::to_string);
        }
        dir = d.parent();
    }
    None
}

/// Hook-callable auto-context injection (spec.md §4.15). Fails silently
/// (returns `None`) within `deadline` on any error, including a timeout.
pub fn inject(
    cwd: &Path,
    prompt: &str,
    budget_tokens: usize,
    journal: &JournalStore,
    patterns: &PatternStore,
    transfer: &crate::transfer::TransferEngine,
    graph: &GraphStore,
    embedder: &dyn crate::embedding::Provider,
    search_db_path: &crate::store::Paths,
    deadline: Duration,
) -> Option<String> {
    let project = derive_project_tag(cwd);
    let keywords = text::keywords(prompt);
    if keywords.is_empty() {
        return None;
    }
    let query_text = keywords.join(" ");
    let limit = (budget_tokens / 20).clamp(3, 50);

    let (tx, rx) = mpsc::channel();
    let outcome = std::thread::scope(|scope| {
        scope.spawn(|| {
            let result = run_injection(search_db_path, &query_text, project, limit, journal, patterns, transfer, graph, embedder);
            let _ = tx.send(result);
        });
        rx.recv_timeout(deadline)
    });

    match outcome {
        Ok(Some(body)) => Some(format!("--- lore context ---\n{body}\n--- end lore context ---")),
        _ => None,
    }
}

fn run_injection(
    paths: &crate::store::Paths,
    query_text: &str,
    project: Option<String>,
    limit: usize,
    journal: &JournalStore,
    patterns: &PatternStore,
    transfer: &crate::transfer::TransferEngine,
    graph: &GraphStore,
    embedder: &dyn crate::embedding::Provider,
) -> Option<String> {
    let mut index = if SearchIndex::exists(paths) {
        SearchIndex::open(paths).ok()?
    } else {
        let mut index = SearchIndex::open(paths).ok()?;
        index.build(journal, patterns, transfer, graph, embedder).ok()?;
        index
    };

    let engine = RetrievalEngine::new();
    let sources = Sources { journal, patterns, transfer, graph, embedder, paths };
    let query = RetrievalQuery { text: query_text.to_string(), mode: Mode::Hybrid, project, limit, compact: true, depth: 2, edges: None };
    let result = engine.search(&mut index, &sources, &query).ok()?;
    if result.hits.is_empty() {
        return None;
    }
    Some(render_compact(&result.hits))
}
