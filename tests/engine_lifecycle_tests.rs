//! End-to-end exercise of the public `Engine` surface (spec.md §6):
//! a session init, a few decisions and a pattern, index build, search
//! across all four retrieval modes, and a graph-synced briefing.

mod common;

use lore::config::Config;
use lore::engine::{Engine, GraphQuery, GraphQueryResult};
use lore::graph::{NodeType, Relation};
use lore::journal::NewDecision;
use lore::pattern_store::NewPattern;
use lore::retrieval::{Mode, RetrievalQuery};
use tempfile::TempDir;

fn engine() -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(Config::default_for(dir.path())).unwrap();
    (dir, engine)
}

#[test]
fn a_session_records_decisions_and_patterns_that_become_searchable() {
    common::init_tracing();
    let (_dir, engine) = engine();

    let session = engine.init_session().unwrap();
    engine
        .record_decision(
            NewDecision {
                decision: "Use rusqlite with the bundled FTS5 feature for lexical search".into(),
                rationale: "avoids a system sqlite dependency across platforms".into(),
                session_id: Some(session.id.clone()),
                ..Default::default()
            },
            false,
        )
        .unwrap();
    engine
        .capture_pattern(
            NewPattern {
                name: "Atomic replace for JSON documents".into(),
                context: "any single-file JSON store such as the graph or goals".into(),
                problem: "a crash mid-write must never leave a truncated document".into(),
                solution: "write to a temp file then rename over the target".into(),
                ..Default::default()
            },
            false,
        )
        .unwrap();

    engine.rebuild_index().unwrap();

    let fts = engine.search(RetrievalQuery { text: "rusqlite FTS5".into(), mode: Mode::Fts, ..Default::default() }).unwrap();
    assert!(!fts.hits.is_empty());
    assert!(!fts.degraded);

    let hybrid = engine.search(RetrievalQuery { text: "atomic replace".into(), mode: Mode::Hybrid, ..Default::default() }).unwrap();
    assert!(!hybrid.hits.is_empty());
    // no embedding provider configured, so hybrid must fall back to lexical only.
    assert!(hybrid.degraded);
}

#[test]
fn graph_query_dispatches_to_the_matching_graph_store_operation() {
    common::init_tracing();
    let (_dir, engine) = engine();

    let a = engine.add_node(NodeType::Concept, "retry budget", Default::default()).unwrap();
    let b = engine.add_node(NodeType::Concept, "backoff policy", Default::default()).unwrap();
    engine.add_edge(&a.id, &b.id, Relation::RelatesTo, 0.8, false).unwrap();

    let outgoing = engine.graph_query(GraphQuery::Outgoing(a.id.clone())).unwrap();
    match outgoing {
        GraphQueryResult::Edges(edges) => assert_eq!(edges.len(), 1),
        other => panic!("expected Edges, got {other:?}"),
    }

    let neighbors = engine.graph_query(GraphQuery::Neighbors(a.id.clone())).unwrap();
    match neighbors {
        GraphQueryResult::Ids(ids) => assert_eq!(ids, vec![b.id.clone()]),
        other => panic!("expected Ids, got {other:?}"),
    }

    let path = engine.graph_query(GraphQuery::ShortestPath { from: a.id.clone(), to: b.id.clone() }).unwrap();
    match path {
        GraphQueryResult::Path(Some(hops)) => assert_eq!(hops.first(), Some(&a.id)),
        other => panic!("expected a Path, got {other:?}"),
    }
}

#[test]
fn sync_graph_mirrors_journal_entities_as_nodes() {
    common::init_tracing();
    let (_dir, engine) = engine();
    engine
        .record_decision(
            NewDecision {
                decision: "Adopt thiserror for the error taxonomy".into(),
                rationale: "structured variants beat string errors at the module boundary".into(),
                ..Default::default()
            },
            false,
        )
        .unwrap();

    let synced = engine.sync_graph().unwrap();
    assert!(synced > 0);

    let hubs = engine.graph_query(GraphQuery::Hubs(5)).unwrap();
    assert!(matches!(hubs, GraphQueryResult::Ranked(_)));
}

#[test]
fn brief_and_subtraction_check_read_across_every_store_without_mutating() {
    common::init_tracing();
    let (_dir, engine) = engine();
    engine
        .record_decision(
            NewDecision { decision: "Use JSONL for the decision journal".into(), rationale: "append-only, crash safe".into(), ..Default::default() },
            false,
        )
        .unwrap();

    let briefing = engine.brief("journal").unwrap();
    assert!(!briefing.decisions.is_empty());

    let before = engine.journal.list(&Default::default()).unwrap().len();
    let _report = engine.subtraction_check().unwrap();
    let after = engine.journal.list(&Default::default()).unwrap().len();
    assert_eq!(before, after);
}
