//! Session transfer (spec.md §4.6) and goal lifecycle (§4.7) driven
//! through the `Engine`, including the resume-time subtraction check and
//! a goal import that lands decisions in the journal.

mod common;

use lore::config::Config;
use lore::engine::Engine;
use lore::intent::{ImportedSpec, ImportedUserStory, OutcomeStatus};
use std::path::Path;
use tempfile::TempDir;

fn engine() -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(Config::default_for(dir.path())).unwrap();
    (dir, engine)
}

#[test]
fn a_session_moves_through_init_snapshot_handoff_and_resume() {
    common::init_tracing();
    let (_dir, engine) = engine();

    let session = engine.init_session().unwrap();
    let snapshotted = engine.snapshot(&session.id, "wired up the retrieval engine", Path::new(".")).unwrap();
    assert_eq!(snapshotted.summary.as_deref(), Some("wired up the retrieval engine"));

    let handed_off = engine
        .handoff(
            &session.id,
            "index build still needs a benchmark",
            vec!["add a criterion bench".into()],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
    assert!(handed_off.ended_at.is_some());
    assert!(handed_off.handoff.is_some());

    let resumed = engine.resume(Some(&session.id)).unwrap();
    assert_eq!(resumed.session.id, session.id);

    let compressed = engine.compress(&session.id).unwrap();
    assert!(compressed.compressed);
    assert!(compressed.context.recent_commands.is_empty());
}

#[test]
fn importing_a_spec_creates_a_goal_and_journals_its_plan_decisions() {
    common::init_tracing();
    let (_dir, engine) = engine();

    let spec = ImportedSpec {
        title: "Hybrid retrieval engine".into(),
        path: "specs/0007-retrieval.md".into(),
        branch: Some("feature/hybrid-retrieval".into()),
        user_stories: vec![ImportedUserStory {
            description: "As a developer I want hybrid search so stale results don't win on keyword overlap alone".into(),
            acceptance_criteria: vec!["RRF fusion is used when both lexical and semantic hits exist".into()],
        }],
        plan_decisions: Vec::new(),
    };

    let goal = engine.import_goal(spec).unwrap();
    assert_eq!(goal.name, "Hybrid retrieval engine");
    assert_eq!(goal.success_criteria.len(), 1);

    let session = engine.init_session().unwrap();
    let assigned = engine.assign_goal(&goal.id, &session.id).unwrap();
    assert_eq!(assigned.lifecycle.assigned_session.as_deref(), Some(session.id.as_str()));

    let progressed = engine.progress_goal(&goal.id).unwrap();
    assert_ne!(progressed.lifecycle.phase, assigned.lifecycle.phase);

    let completed = engine.complete_goal(&goal.id, OutcomeStatus::Completed, "shipped behind a feature flag").unwrap();
    assert!(completed.outcome.is_some());

    let tagged = engine.journal.list(&lore::journal::ListFilter { tag: Some(format!("spec:{}", goal.id)), ..Default::default() }).unwrap();
    assert_eq!(tagged.len(), 1);
}
