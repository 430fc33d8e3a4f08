//! Outcome resolution side effects (spec.md §4.11) and inbox
//! promote/discard (§4.12), exercised through `Engine`.

mod common;

use lore::config::Config;
use lore::engine::Engine;
use lore::inbox::ObservationStatus;
use lore::journal::NewDecision;
use lore::outcome::Outcome;
use lore::pattern_store::NewPattern;
use tempfile::TempDir;

fn engine() -> (TempDir, Engine) {
    let dir = TempDir::new().unwrap();
    let engine = Engine::new(Config::default_for(dir.path())).unwrap();
    (dir, engine)
}

#[test]
fn resolving_a_decision_as_successful_validates_patterns_sharing_an_entity() {
    common::init_tracing();
    let (_dir, engine) = engine();

    let decision = engine
        .record_decision(
            NewDecision { decision: "Use fs2 for advisory file locking".into(), rationale: "cross-platform, no extra daemon".into(), ..Default::default() },
            false,
        )
        .unwrap();
    let pattern = engine
        .capture_pattern(
            NewPattern {
                name: "fs2 advisory locks around append-only files".into(),
                context: "any store that appends from more than one process".into(),
                problem: "concurrent appenders can interleave partial lines".into(),
                solution: "take a shared lock for append, exclusive for compaction".into(),
                ..Default::default()
            },
            false,
        )
        .unwrap();

    let pending = engine.review_pending(0).unwrap();
    assert!(pending.iter().any(|d| d.id == decision.id));

    engine.resolve_outcome(&decision.id, Outcome::Successful, Some("held up under load testing".into())).unwrap();

    let updated = engine.patterns.show(&pattern.id).unwrap();
    assert_eq!(updated.validations, 1);
}

#[test]
fn resolving_a_decision_as_abandoned_appends_a_failure_record() {
    common::init_tracing();
    let (_dir, engine) = engine();
    let decision = engine
        .record_decision(NewDecision { decision: "Adopt actix-web for the HTTP layer".into(), rationale: "x".into(), ..Default::default() }, false)
        .unwrap();

    engine.resolve_outcome(&decision.id, Outcome::Abandoned, Some("pulled in an async runtime we don't otherwise need".into())).unwrap();

    let failures = engine.failures.list(&Default::default()).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error_type, "AbandonedDecision");
}

#[test]
fn an_observation_moves_from_raw_to_promoted_and_then_stays_out_of_the_raw_list() {
    common::init_tracing();
    let (_dir, engine) = engine();
    let observation = engine.observe("the FTS5 ranking ignores recency without a decay term", Some("pairing session".into()), vec!["search".into()]).unwrap();

    let raw = engine.list_inbox(Some(ObservationStatus::Raw)).unwrap();
    assert_eq!(raw.len(), 1);

    engine.promote(&observation.id).unwrap();

    let raw_after = engine.list_inbox(Some(ObservationStatus::Raw)).unwrap();
    assert!(raw_after.is_empty());
    let promoted = engine.list_inbox(Some(ObservationStatus::Promoted)).unwrap();
    assert_eq!(promoted.len(), 1);
}

#[test]
fn discarding_an_observation_is_reflected_immediately() {
    common::init_tracing();
    let (_dir, engine) = engine();
    let observation = engine.observe("noise, not worth keeping", None, Vec::new()).unwrap();
    engine.discard(&observation.id).unwrap();

    let discarded = engine.list_inbox(Some(ObservationStatus::Discarded)).unwrap();
    assert_eq!(discarded.len(), 1);
    assert_eq!(discarded[0].id, observation.id);
}
