//! Top-level `Engine` (spec.md §9 re-architecture note): owns one instance
//! of every store, constructed from a [`Config`], and is the single entry
//! point a CLI dispatcher, HTTP handler, or MCP server would be built
//! against without reaching into module internals (spec.md §6).

use crate::config::Config;
use crate::embedding::{HttpProvider, NullProvider, Provider};
use crate::error::Result;
use crate::failure::FailureStore;
use crate::graph::{Edge, GraphStore, Node, NodeType, Relation, SearchHit as GraphSearchHit};
use crate::inbox::{Inbox, Observation, ObservationStatus};
use crate::intent::{Goal, ImportedSpec, IntentStore, OutcomeStatus};
use crate::journal::{Decision, JournalStore, NewDecision};
use crate::outcome::{Outcome, OutcomeEngine};
use crate::pattern_store::{AntiPattern, NewAntiPattern, NewPattern, Pattern, PatternStore};
use crate::retrieval::{RetrievalEngine, RetrievalQuery, RetrievalResult, Sources};
use crate::search::SearchIndex;
use crate::store::Paths;
use crate::transfer::TransferEngine;
use std::collections::HashMap;
use std::time::Duration;

pub struct Engine {
    config: Config,
    paths: Paths,
    pub journal: JournalStore,
    pub patterns: PatternStore,
    pub failures: FailureStore,
    pub graph: GraphStore,
    pub inbox: Inbox,
    pub transfer: TransferEngine,
    pub intent: IntentStore,
    embedder: Box<dyn Provider>,
    retrieval: RetrievalEngine,
}

impl Engine {
    /// Resolves every store from `config.data_root`, creating the
    /// directory layout if absent. Picks [`HttpProvider`] when an embedding
    /// URL is configured, else [`NullProvider`] (hybrid degrades to
    /// lexical, spec.md §9).
    pub fn new(config: Config) -> Result<Self> {
        let paths = Paths::new(&config.data_root);
        paths.ensure_dirs()?;

        let embedder: Box<dyn Provider> = match &config.embedding_url {
            Some(url) => Box::new(HttpProvider::new(url.clone(), config.embedding_model.clone(), config.embedding_timeout_ms)),
            None => Box::new(NullProvider),
        };

        tracing::info!(data_root = %paths.root().display(), "engine initialized");
        Ok(Self {
            journal: JournalStore::new(paths.clone(), config.dedup_threshold, config.contradiction_threshold),
            patterns: PatternStore::new(paths.clone(), config.dedup_threshold),
            failures: FailureStore::new(paths.clone()),
            graph: GraphStore::new(paths.clone()),
            inbox: Inbox::new(paths.clone()),
            transfer: TransferEngine::new(paths.clone()),
            intent: IntentStore::new(paths.clone()),
            embedder,
            retrieval: RetrievalEngine::new(),
            paths,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    fn sources(&self) -> Sources<'_> {
        Sources {
            journal: &self.journal,
            patterns: &self.patterns,
            transfer: &self.transfer,
            graph: &self.graph,
            embedder: self.embedder.as_ref(),
            paths: &self.paths,
        }
    }

    pub fn outcome(&self) -> OutcomeEngine<'_> {
        OutcomeEngine::new(&self.journal, &self.patterns, &self.failures)
    }

    /// Idempotent full rebuild of the search index (spec.md §4.8).
    pub fn rebuild_index(&self) -> Result<()> {
        let mut index = SearchIndex::open(&self.paths)?;
        index.build(&self.journal, &self.patterns, &self.transfer, &self.graph, self.embedder.as_ref())
    }

    /// Runs `query` through the retrieval engine, rebuilding the index
    /// on demand if it is absent (spec.md §4.9 fail-open behavior).
    pub fn search(&self, query: RetrievalQuery) -> Result<RetrievalResult> {
        let mut index = if SearchIndex::exists(&self.paths) {
            SearchIndex::open(&self.paths)?
        } else {
            let mut index = SearchIndex::open(&self.paths)?;
            index.build(&self.journal, &self.patterns, &self.transfer, &self.graph, self.embedder.as_ref())?;
            index
        };
        self.retrieval.search(&mut index, &self.sources(), &query)
    }

    /// Idempotent reconciliation from the journal into the graph
    /// (spec.md §4.5).
    pub fn sync_graph(&self) -> Result<usize> {
        self.graph.sync(&self.journal)
    }

    /// Topic-scoped briefing composing journal, patterns, failures, and
    /// graph (spec.md §4.13).
    pub fn brief(&self, topic: &str) -> Result<crate::briefing::Briefing> {
        crate::briefing::brief(topic, &self.journal, &self.patterns, &self.failures, &self.graph)
    }

    /// Advisory read-time warnings invoked by `resume` (spec.md §4.14).
    pub fn subtraction_check(&self) -> Result<crate::briefing::SubtractionReport> {
        crate::briefing::subtraction_check(&self.journal, &self.patterns, &self.graph, self.config.subtraction_pending_days)
    }

    /// Assembles session-start context: the resumed session, recent
    /// decisions for its project, relevant patterns, and a subtraction
    /// check. Never mutates the session it reads (spec.md §4.6).
    pub fn resume(&self, session_id: Option<&str>) -> Result<ResumeContext> {
        let session = self.transfer.resume(session_id)?;
        let project = session.context.spec.clone();
        let filter = crate::journal::ListFilter { limit: Some(10), project, ..Default::default() };
        let recent_decisions = self.journal.list(&filter)?;
        let subtraction = self.subtraction_check()?;
        Ok(ResumeContext { session, recent_decisions, subtraction })
    }

    /// Hook-callable auto-context injection, fail-silent within a 5s
    /// deadline (spec.md §4.15).
    pub fn inject(&self, cwd: &std::path::Path, prompt: &str, budget_tokens: usize) -> Option<String> {
        crate::briefing::inject(
            cwd,
            prompt,
            budget_tokens,
            &self.journal,
            &self.patterns,
            &self.transfer,
            &self.graph,
            self.embedder.as_ref(),
            &self.paths,
            Duration::from_secs(5),
        )
    }

    // -- §6 public method surface -------------------------------------
    // Thin delegations so a CLI dispatcher, HTTP handler, or MCP server
    // can be built against this crate without reaching into module
    // internals (spec.md §6).

    /// Records the decision, then runs the advisory contradiction scan
    /// (spec.md §4.2, §4.10) against the rest of the journal: a
    /// contradicting pair gets a `tracing::warn!` and, when both sides
    /// already exist as graph nodes, a bidirectional `contradicts` edge.
    /// Never fails the write — contradiction is advisory only.
    pub fn record_decision(&self, input: NewDecision, force: bool) -> Result<Decision> {
        let decision = self.journal.record(input, force)?;
        crate::guard::ensure_decision_node(&self.graph, &decision)?;
        crate::guard::contradiction_scan(&self.journal, &self.graph, &decision, self.journal.contradiction_threshold())?;
        Ok(decision)
    }

    pub fn update_decision(&self, id: &str, mutate: impl FnOnce(&mut Decision)) -> Result<Decision> {
        self.journal.update(id, mutate)
    }

    pub fn capture_pattern(&self, input: NewPattern, force: bool) -> Result<Pattern> {
        self.patterns.capture(input, force)
    }

    pub fn validate_pattern(&self, id: &str) -> Result<Pattern> {
        self.patterns.validate(id)
    }

    pub fn deprecate_pattern(&self, id: &str) -> Result<Pattern> {
        self.patterns.deprecate(id)
    }

    pub fn warn_anti_pattern(&self, input: NewAntiPattern) -> Result<AntiPattern> {
        self.patterns.warn(input)
    }

    pub fn observe(&self, content: impl Into<String>, source: Option<String>, tags: Vec<String>) -> Result<Observation> {
        self.inbox.observe(content, source, tags)
    }

    pub fn list_inbox(&self, status: Option<ObservationStatus>) -> Result<Vec<Observation>> {
        self.inbox.list(status)
    }

    pub fn promote(&self, id: &str) -> Result<()> {
        self.inbox.promote(id)
    }

    pub fn discard(&self, id: &str) -> Result<()> {
        self.inbox.discard(id)
    }

    pub fn add_node(&self, node_type: NodeType, name: &str, data: HashMap<String, serde_json::Value>) -> Result<Node> {
        self.graph.add(node_type, name, data)
    }

    pub fn add_edge(&self, from: &str, to: &str, relation: Relation, weight: f64, bidirectional: bool) -> Result<Edge> {
        self.graph.add_edge(from, to, relation, weight, bidirectional, Some(&self.journal))
    }

    /// Dispatches one of the graph's read-only traversal/query operations
    /// (spec.md §4.5) by name, so a caller needn't reach into `GraphStore`.
    pub fn graph_query(&self, query: GraphQuery) -> Result<GraphQueryResult> {
        Ok(match query {
            GraphQuery::Outgoing(node) => GraphQueryResult::Edges(self.graph.outgoing(&node)?),
            GraphQuery::Incoming(node) => GraphQueryResult::Edges(self.graph.incoming(&node)?),
            GraphQuery::Neighbors(node) => GraphQueryResult::Ids(self.graph.neighbors(&node)?),
            GraphQuery::Bfs { start, max_depth } => GraphQueryResult::Ranked(self.graph.bfs(&start, max_depth)?),
            GraphQuery::Dfs { start, max_depth } => GraphQueryResult::Ranked(self.graph.dfs(&start, max_depth)?),
            GraphQuery::ShortestPath { from, to } => GraphQueryResult::Path(self.graph.shortest_path(&from, &to)?),
            GraphQuery::Related { start, max_hops } => GraphQueryResult::Related(self.graph.related(&start, max_hops)?),
            GraphQuery::Clusters => GraphQueryResult::Clusters(self.graph.clusters()?),
            GraphQuery::Orphans => GraphQueryResult::Ids(self.graph.orphans()?),
            GraphQuery::Hubs(limit) => GraphQueryResult::Ranked(self.graph.hubs(limit)?),
            GraphQuery::Search(text) => GraphQueryResult::Hits(self.graph.search(&text)?),
        })
    }

    pub fn init_session(&self) -> Result<crate::transfer::Session> {
        self.transfer.init()
    }

    pub fn snapshot(&self, session_id: &str, summary: impl Into<String>, cwd: &std::path::Path) -> Result<crate::transfer::Session> {
        self.transfer.snapshot(session_id, summary, cwd)
    }

    pub fn handoff(
        &self,
        session_id: &str,
        message: impl Into<String>,
        next_steps: Vec<String>,
        blockers: Vec<String>,
        questions: Vec<String>,
    ) -> Result<crate::transfer::Session> {
        self.transfer.handoff(session_id, message, next_steps, blockers, questions)
    }

    pub fn compress(&self, session_id: &str) -> Result<crate::transfer::Session> {
        self.transfer.compress(session_id)
    }

    pub fn import_goal(&self, spec: ImportedSpec) -> Result<Goal> {
        self.intent.import(spec, &self.journal)
    }

    pub fn assign_goal(&self, id: &str, session_id: &str) -> Result<Goal> {
        self.intent.assign(id, session_id)
    }

    pub fn progress_goal(&self, id: &str) -> Result<Goal> {
        self.intent.progress(id)
    }

    pub fn complete_goal(&self, id: &str, outcome: OutcomeStatus, notes: &str) -> Result<Goal> {
        self.intent.complete(id, outcome, notes, &self.journal)
    }

    pub fn review_pending(&self, older_than_days: u32) -> Result<Vec<Decision>> {
        self.outcome().list_pending(older_than_days)
    }

    pub fn resolve_outcome(&self, id: &str, outcome: Outcome, lesson: Option<String>) -> Result<Decision> {
        self.outcome().resolve(id, outcome, lesson)
    }
}

/// Dispatch enum for [`Engine::graph_query`] (spec.md §4.5 read
/// operations).
#[derive(Debug, Clone)]
pub enum GraphQuery {
    Outgoing(String),
    Incoming(String),
    Neighbors(String),
    Bfs { start: String, max_depth: usize },
    Dfs { start: String, max_depth: usize },
    ShortestPath { from: String, to: String },
    Related { start: String, max_hops: usize },
    Clusters,
    Orphans,
    Hubs(usize),
    Search(String),
}

#[derive(Debug, Clone)]
pub enum GraphQueryResult {
    Edges(Vec<Edge>),
    Ids(Vec<String>),
    Ranked(Vec<(String, usize)>),
    Path(Option<Vec<String>>),
    Related(Vec<(String, usize, String)>),
    Clusters(Vec<Vec<String>>),
    Hits(Vec<GraphSearchHit>),
}

#[derive(Debug, Clone)]
pub struct ResumeContext {
    pub session: crate::transfer::Session,
    pub recent_decisions: Vec<crate::journal::Decision>,
    pub subtraction: crate::briefing::SubtractionReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::NewDecision;
    use tempfile::TempDir;

    fn engine(dir: &TempDir) -> Engine {
        Engine::new(Config::default_for(dir.path())).unwrap()
    }

    #[test]
    fn new_creates_the_on_disk_layout() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        assert!(engine.paths().journal_index_dir().parent().unwrap().exists());
    }

    #[test]
    fn record_then_search_round_trips_through_the_engine() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        engine.journal.record(NewDecision { decision: "Use rusqlite FTS5 for search".into(), rationale: "bundled, no server".into(), ..Default::default() }, false).unwrap();
        engine.rebuild_index().unwrap();

        let result = engine.search(RetrievalQuery { text: "rusqlite".into(), mode: crate::retrieval::Mode::Fts, ..Default::default() }).unwrap();
        assert!(!result.hits.is_empty());
    }

    #[test]
    fn resume_without_any_session_is_not_found() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        assert!(engine.resume(None).is_err());
    }

    #[test]
    fn resume_after_init_returns_a_subtraction_report() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        let session = engine.transfer.init().unwrap();
        let ctx = engine.resume(Some(&session.id)).unwrap();
        assert_eq!(ctx.session.id, session.id);
    }

    #[test]
    fn record_decision_records_a_contradicts_edge_between_graph_nodes() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir);
        engine
            .record_decision(NewDecision { decision: "Use `config.rs` as the single source of Config".into(), rationale: "x".into(), ..Default::default() }, false)
            .unwrap();
        let b = engine
            .record_decision(
                NewDecision { decision: "Never read `config.rs` directly, always go through Config::load".into(), rationale: "y".into(), ..Default::default() },
                true,
            )
            .unwrap();

        let b_node = engine.graph.find_by_name(&b.decision).unwrap().expect("decision node exists");
        let outgoing = engine.graph.outgoing(&b_node.id).unwrap();
        assert!(outgoing.iter().any(|e| e.relation == crate::graph::Relation::Contradicts));
    }
}
