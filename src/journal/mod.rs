//! Decision journal (spec.md §4.2): `record`, `get`, `update`, `list`,
//! `search`, `stats`, `compact` over an append-only JSONL log plus
//! secondary indexes.

pub mod index;
pub mod types;

use crate::error::{Error, Result};
use crate::store::lock::{ExclusiveLock, SharedLock};
use crate::store::{fs as storefs, Paths};
use crate::{ids, spec_quality, text};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
pub use types::{Decision, DecisionOutcome, DecisionStatus, DecisionType, NewDecision};

/// Optional filters for [`JournalStore::list`]. Unset fields match
/// everything. `project` matches a decision's first tag, the same
/// derivation `search::SearchIndex::build` uses when it ingests decisions
/// into the FTS project column (decisions with no tags fall under
/// `"default"`).
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub limit: Option<usize>,
    pub decision_type: Option<DecisionType>,
    pub outcome: Option<DecisionOutcome>,
    pub tag: Option<String>,
    pub project: Option<String>,
    pub session_id: Option<String>,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

#[derive(Debug, Clone, Default)]
pub struct JournalStats {
    pub total: usize,
    pub by_outcome: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub average_spec_quality: f64,
}

pub struct JournalStore {
    paths: Paths,
    /// 0.70: two decisions whose word-set Jaccard similarity meets or
    /// exceeds this are treated as duplicates unless `force` is set.
    dedup_threshold: f64,
    /// 0.30: candidate pairs below this similarity but sharing ≥2
    /// entities are flagged as a possible contradiction (advisory only).
    contradiction_threshold: f64,
}

impl JournalStore {
    pub fn new(paths: Paths, dedup_threshold: f64, contradiction_threshold: f64) -> Self {
        Self { paths, dedup_threshold, contradiction_threshold }
    }

    fn read_all(&self) -> Result<Vec<Decision>> {
        storefs::read_jsonl(&self.paths.decisions_file())
    }

    /// Latest revision per id, most recent first.
    fn latest_revisions(&self) -> Result<Vec<Decision>> {
        let all = self.read_all()?;
        let mut by_id: HashMap<String, Decision> = HashMap::new();
        for d in all {
            by_id.insert(d.id.clone(), d);
        }
        let mut out: Vec<Decision> = by_id.into_values().collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(out)
    }

    /// Record a new decision. Runs the dedup guard first unless `force`
    /// is set; dedup refusal is the only hard failure. The contradiction
    /// guard is advisory and needs the graph, so it is not run here —
    /// `Engine::record_decision` runs it against the freshly recorded
    /// decision after this returns.
    pub fn record(&self, input: NewDecision, force: bool) -> Result<Decision> {
        let existing = self.latest_revisions()?;

        if !force {
            if let Some(dup) = existing.iter().find(|d| {
                d.status != DecisionStatus::Retracted
                    && text::jaccard(&d.decision, &input.decision) >= self.dedup_threshold
            }) {
                return Err(Error::Conflict(format!(
                    "decision resembles existing {} (similarity >= {:.2}); pass force to record anyway",
                    dup.id, self.dedup_threshold
                )));
            }
        }

        let entities = text::extract_entities(&format!("{} {}", input.decision, input.rationale));
        let decision_type = input.decision_type.unwrap_or_else(|| types::detect_type(&input.decision));
        let spec_quality = spec_quality::decision_score(
            &input.decision,
            &input.rationale,
            &input.alternatives,
            &entities,
            &input.tags,
        );

        let decision = Decision {
            id: ids::decision_id(),
            timestamp: ids::now(),
            session_id: input.session_id,
            decision: input.decision,
            rationale: input.rationale,
            alternatives: input.alternatives,
            outcome: DecisionOutcome::Pending,
            decision_type,
            entities,
            tags: input.tags,
            lesson_learned: input.lesson_learned,
            related_decisions: input.related_decisions,
            git_commit: input.git_commit,
            status: DecisionStatus::Active,
            superseded_by: None,
            spec_quality,
            schema_version: 1,
        };

        let _lock = SharedLock::acquire(&self.paths.decisions_file())?;
        storefs::append_line(&self.paths.decisions_file(), &decision)?;
        self.index(&decision)?;
        tracing::debug!(id = %decision.id, "recorded decision");
        Ok(decision)
    }

    fn index(&self, decision: &Decision) -> Result<()> {
        let dir = self.paths.journal_index_dir();
        index::add(&dir, "date", &decision.timestamp.format("%Y-%m-%d").to_string(), &decision.id)?;
        index::add(&dir, "type", type_key(decision.decision_type), &decision.id)?;
        for entity in &decision.entities {
            index::add(&dir, "entity", entity, &decision.id)?;
        }
        for tag in &decision.tags {
            index::add(&dir, "tag", tag, &decision.id)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Decision> {
        self.latest_revisions()?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound { kind: "decision", id: id.to_string() })
    }

    /// Append a full new revision of `id` with `mutate` applied. Revisions
    /// accumulate in the log; `get`/`list` always resolve to the latest.
    pub fn update(&self, id: &str, mutate: impl FnOnce(&mut Decision)) -> Result<Decision> {
        let mut decision = self.get(id)?;
        mutate(&mut decision);
        let _lock = SharedLock::acquire(&self.paths.decisions_file())?;
        storefs::append_line(&self.paths.decisions_file(), &decision)?;
        self.index(&decision)?;
        tracing::debug!(id = %decision.id, "updated decision");
        Ok(decision)
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Decision>> {
        let mut out = self.latest_revisions()?;
        if let Some(t) = filter.decision_type {
            out.retain(|d| d.decision_type == t);
        }
        if let Some(o) = filter.outcome {
            out.retain(|d| d.outcome == o);
        }
        if let Some(tag) = &filter.tag {
            out.retain(|d| d.tags.iter().any(|t| t == tag));
        }
        if let Some(session) = &filter.session_id {
            out.retain(|d| d.session_id.as_deref() == Some(session.as_str()));
        }
        if let Some(project) = &filter.project {
            out.retain(|d| project_of(d) == *project);
        }
        if let Some((from, to)) = filter.date_range {
            out.retain(|d| d.timestamp >= from && d.timestamp <= to);
        }
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    /// Case-insensitive substring match across every free-text field.
    pub fn search(&self, query: &str) -> Result<Vec<Decision>> {
        let q = query.to_lowercase();
        Ok(self
            .latest_revisions()?
            .into_iter()
            .filter(|d| {
                d.decision.to_lowercase().contains(&q)
                    || d.rationale.to_lowercase().contains(&q)
                    || d.lesson_learned.as_deref().unwrap_or("").to_lowercase().contains(&q)
                    || d.alternatives.iter().any(|a| a.to_lowercase().contains(&q))
                    || d.entities.iter().any(|e| e.to_lowercase().contains(&q))
                    || d.tags.iter().any(|t| t.to_lowercase().contains(&q))
            })
            .collect())
    }

    pub fn stats(&self) -> Result<JournalStats> {
        let decisions = self.latest_revisions()?;
        let mut stats = JournalStats { total: decisions.len(), ..Default::default() };
        let mut quality_sum = 0.0;
        for d in &decisions {
            *stats.by_outcome.entry(format!("{:?}", d.outcome)).or_insert(0) += 1;
            *stats.by_type.entry(format!("{:?}", d.decision_type)).or_insert(0) += 1;
            quality_sum += d.spec_quality;
        }
        if stats.total > 0 {
            stats.average_spec_quality = quality_sum / stats.total as f64;
        }
        Ok(stats)
    }

    /// Rewrite the log keeping only the latest revision per id, and rebuild
    /// every index from scratch. Exclusive for the duration of the
    /// read-modify-write.
    pub fn compact(&self) -> Result<usize> {
        let _lock = ExclusiveLock::acquire(&self.paths.decisions_file())?;
        let latest = self.latest_revisions()?;
        let mut sorted = latest.clone();
        sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut body = String::new();
        for d in &sorted {
            body.push_str(&serde_json::to_string(d)?);
            body.push('\n');
        }
        storefs::atomic_write(&self.paths.decisions_file(), body.as_bytes())?;

        index::clear_all(&self.paths.journal_index_dir())?;
        for d in &sorted {
            self.index(d)?;
        }
        tracing::info!(kept = sorted.len(), "compacted journal");
        Ok(sorted.len())
    }

    pub(crate) fn contradiction_threshold(&self) -> f64 {
        self.contradiction_threshold
    }
}

/// A decision's project is its first tag, `"default"` if untagged —
/// matching `search::SearchIndex::build`'s derivation for the FTS
/// project column, so `ListFilter::project` and project-scoped search
/// agree on what a decision's project is.
fn project_of(d: &Decision) -> &str {
    d.tags.first().map(|t| t.as_str()).unwrap_or("default")
}

fn type_key(t: DecisionType) -> &'static str {
    match t {
        DecisionType::Architecture => "architecture",
        DecisionType::Implementation => "implementation",
        DecisionType::Naming => "naming",
        DecisionType::Tooling => "tooling",
        DecisionType::Process => "process",
        DecisionType::Bugfix => "bugfix",
        DecisionType::Refactor => "refactor",
        DecisionType::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> JournalStore {
        JournalStore::new(Paths::new(dir.path()), 0.70, 0.30)
    }

    fn input(decision: &str) -> NewDecision {
        NewDecision { decision: decision.to_string(), rationale: "because reasons, written out long enough".into(), ..Default::default() }
    }

    #[test]
    fn record_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let d = store.record(input("Use JSONL for the journal"), false).unwrap();
        let fetched = store.get(&d.id).unwrap();
        assert_eq!(fetched.decision, "Use JSONL for the journal");
        assert_eq!(fetched.status, DecisionStatus::Active);
    }

    #[test]
    fn near_duplicate_is_rejected_without_force() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.record(input("Safe bash arithmetic using double parens"), false).unwrap();
        let result = store.record(input("Safe Bash arith using double parens"), false);
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn near_duplicate_is_allowed_with_force() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.record(input("Safe bash arithmetic using double parens"), false).unwrap();
        let second = store.record(input("Safe Bash arith using double parens"), true);
        assert!(second.is_ok());
    }

    #[test]
    fn update_appends_a_revision_and_list_returns_latest() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let d = store.record(input("Adopt layered architecture"), false).unwrap();
        store.update(&d.id, |dec| dec.outcome = DecisionOutcome::Successful).unwrap();
        let list = store.list(&ListFilter::default()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].outcome, DecisionOutcome::Successful);
    }

    #[test]
    fn search_matches_rationale_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.record(input("Pin the rusqlite bundled feature"), false).unwrap();
        let hits = store.search("RUSQLITE").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn list_by_project_matches_the_first_tag_and_untagged_decisions_fall_under_default() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.record(NewDecision { tags: vec!["api-gateway".into()], ..input("Use axum for the HTTP layer") }, false).unwrap();
        store.record(NewDecision { tags: vec!["lore-core".into()], ..input("Use rusqlite for the search index") }, false).unwrap();
        store.record(input("Adopt a changelog format"), false).unwrap();

        let gateway = store.list(&ListFilter { project: Some("api-gateway".into()), ..Default::default() }).unwrap();
        assert_eq!(gateway.len(), 1);
        assert_eq!(gateway[0].decision, "Use axum for the HTTP layer");

        let untagged = store.list(&ListFilter { project: Some("default".into()), ..Default::default() }).unwrap();
        assert_eq!(untagged.len(), 1);
        assert_eq!(untagged[0].decision, "Adopt a changelog format");
    }

    #[test]
    fn list_by_date_range_excludes_decisions_outside_the_bound() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let d = store.record(input("Use chrono for all timestamps"), false).unwrap();

        let includes = store.list(&ListFilter { date_range: Some((d.timestamp - chrono::Duration::minutes(1), d.timestamp + chrono::Duration::minutes(1))), ..Default::default() }).unwrap();
        assert_eq!(includes.len(), 1);

        let excludes = store.list(&ListFilter { date_range: Some((d.timestamp + chrono::Duration::minutes(1), d.timestamp + chrono::Duration::minutes(2))), ..Default::default() }).unwrap();
        assert!(excludes.is_empty());
    }

    #[test]
    fn compact_keeps_only_the_latest_revision_per_id() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let d = store.record(input("Use fs2 for locking"), false).unwrap();
        store.update(&d.id, |dec| dec.outcome = DecisionOutcome::Successful).unwrap();
        let kept = store.compact().unwrap();
        assert_eq!(kept, 1);
        let all: Vec<Decision> = storefs::read_jsonl(&Paths::new(dir.path()).decisions_file()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].outcome, DecisionOutcome::Successful);
    }
}
