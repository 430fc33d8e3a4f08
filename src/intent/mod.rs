//! Goal lifecycle and spec import (spec.md §4.7): one YAML file per goal.

pub mod types;

use crate::error::{Error, Result};
use crate::ids;
use crate::journal::{JournalStore, NewDecision};
use crate::store::lock::ExclusiveLock;
use crate::store::{fs as storefs, Paths};
pub use types::{
    CriterionStatus, Goal, GoalOutcome, GoalSource, GoalStatus, ImportedPlanDecision, ImportedSpec,
    ImportedUserStory, Lifecycle, NewGoal, OutcomeStatus, Phase, Priority, SuccessCriterion,
};

pub struct IntentStore {
    paths: Paths,
}

impl IntentStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    fn read(&self, id: &str) -> Result<Goal> {
        let path = self.paths.goal_file(id);
        if !path.exists() {
            return Err(Error::NotFound { kind: "goal", id: id.to_string() });
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    fn write(&self, goal: &Goal) -> Result<()> {
        let _lock = ExclusiveLock::acquire(&self.paths.goal_file(&goal.id))?;
        storefs::atomic_write_yaml(&self.paths.goal_file(&goal.id), goal)
    }

    pub fn create(&self, input: NewGoal) -> Result<Goal> {
        let goal = Goal {
            id: ids::goal_id(),
            name: input.name,
            description: input.description,
            status: GoalStatus::Draft,
            priority: input.priority,
            deadline: input.deadline,
            success_criteria: Vec::new(),
            depends_on: Vec::new(),
            projects: input.projects,
            tags: input.tags,
            source: None,
            lifecycle: Lifecycle::default(),
            outcome: None,
            schema_version: 1,
        };
        self.write(&goal)?;
        tracing::debug!(id = %goal.id, "created goal");
        Ok(goal)
    }

    pub fn get(&self, id: &str) -> Result<Goal> {
        self.read(id)
    }

    pub fn list(&self) -> Result<Vec<Goal>> {
        let dir = self.paths.goals_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().extension().map(|e| e == "yaml").unwrap_or(false) {
                let text = std::fs::read_to_string(entry.path())?;
                out.push(serde_yaml::from_str(&text)?);
            }
        }
        Ok(out)
    }

    pub fn set_status(&self, id: &str, status: GoalStatus) -> Result<Goal> {
        let mut goal = self.read(id)?;
        goal.status = status;
        self.write(&goal)?;
        Ok(goal)
    }

    /// Binds a goal to a session; if still in `specify`/`plan`, advances
    /// `lifecycle.phase` to `implement` (spec.md §4.7).
    pub fn assign(&self, id: &str, session_id: &str) -> Result<Goal> {
        let mut goal = self.read(id)?;
        goal.lifecycle.assigned_session = Some(session_id.to_string());
        goal.lifecycle.assigned_at = Some(ids::now());
        if matches!(goal.lifecycle.phase, Phase::Specify | Phase::Plan) {
            goal.lifecycle.phase = Phase::Implement;
        }
        self.write(&goal)?;
        Ok(goal)
    }

    /// Advances `lifecycle.phase` one step forward.
    pub fn progress(&self, id: &str) -> Result<Goal> {
        let mut goal = self.read(id)?;
        goal.lifecycle.phase = match goal.lifecycle.phase {
            Phase::Specify => Phase::Plan,
            Phase::Plan => Phase::Tasks,
            Phase::Tasks => Phase::Implement,
            Phase::Implement => Phase::Complete,
            Phase::Complete => Phase::Complete,
        };
        self.write(&goal)?;
        Ok(goal)
    }

    /// Stamps `outcome`, maps it onto `status`, writes a summarizing
    /// journal decision, and clears the goal's session binding.
    pub fn complete(&self, id: &str, outcome: OutcomeStatus, notes: &str, journal: &JournalStore) -> Result<Goal> {
        let mut goal = self.read(id)?;
        let session_id = goal.lifecycle.assigned_session.clone();

        let decision = journal.record(
            NewDecision {
                decision: format!("Goal {} outcome: {:?} — {}", goal.name, outcome, notes),
                rationale: notes.to_string(),
                tags: vec!["spec-outcome".to_string(), format!("spec:{id}")],
                session_id: session_id.clone(),
                ..Default::default()
            },
            true,
        )?;

        goal.status = match outcome {
            OutcomeStatus::Completed => GoalStatus::Completed,
            OutcomeStatus::Failed => GoalStatus::Blocked,
            OutcomeStatus::Abandoned => GoalStatus::Cancelled,
        };
        goal.outcome = Some(GoalOutcome {
            status: outcome,
            completed_at: ids::now(),
            session_id,
            journal_entry: Some(decision.id),
        });
        goal.lifecycle.assigned_session = None;
        self.write(&goal)?;
        tracing::info!(id = %goal.id, outcome = ?outcome, "goal completed");
        Ok(goal)
    }

    /// Maps an externally-parsed spec into a goal plus tagged journal plan
    /// decisions. The only entry point this crate owns for spec import
    /// (spec.md §1, §4.7) — `ImportedSpec` itself is produced by an
    /// out-of-scope markdown parser.
    pub fn import(&self, spec: ImportedSpec, journal: &JournalStore) -> Result<Goal> {
        let success_criteria = spec
            .user_stories
            .iter()
            .enumerate()
            .map(|(i, story)| SuccessCriterion {
                id: format!("sc-{}", i + 1),
                description: story.description.clone(),
                priority: Priority::Medium,
                status: CriterionStatus::Pending,
                acceptance: story.acceptance_criteria.clone(),
            })
            .collect();

        let mut goal = Goal {
            id: ids::goal_id(),
            name: spec.title.clone(),
            description: String::new(),
            status: GoalStatus::Draft,
            priority: Priority::Medium,
            deadline: None,
            success_criteria,
            depends_on: Vec::new(),
            projects: Vec::new(),
            tags: Vec::new(),
            source: Some(GoalSource {
                source_type: "spec_import".to_string(),
                path: spec.path.clone(),
                branch: spec.branch.clone(),
                imported_at: ids::now(),
            }),
            lifecycle: Lifecycle::default(),
            outcome: None,
            schema_version: 1,
        };

        for plan_decision in &spec.plan_decisions {
            let decision = journal.record(
                NewDecision {
                    decision: plan_decision.decision.clone(),
                    rationale: plan_decision.rationale.clone(),
                    tags: vec![format!("spec:{}", goal.id), "plan-decision".to_string()],
                    ..Default::default()
                },
                true,
            )?;
            goal.lifecycle.plan_decisions.push(decision.id);
        }

        self.write(&goal)?;
        tracing::info!(id = %goal.id, "imported goal from spec");
        Ok(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stores(dir: &TempDir) -> (IntentStore, JournalStore) {
        (IntentStore::new(Paths::new(dir.path())), JournalStore::new(Paths::new(dir.path()), 0.70, 0.30))
    }

    #[test]
    fn create_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let (intent, _journal) = stores(&dir);
        let goal = intent.create(NewGoal { name: "Ship Lore".into(), ..Default::default() }).unwrap();
        let fetched = intent.get(&goal.id).unwrap();
        assert_eq!(fetched.status, GoalStatus::Draft);
    }

    #[test]
    fn assign_advances_phase_from_specify_to_implement() {
        let dir = TempDir::new().unwrap();
        let (intent, _journal) = stores(&dir);
        let goal = intent.create(NewGoal { name: "Ship Lore".into(), ..Default::default() }).unwrap();
        let assigned = intent.assign(&goal.id, "session-1").unwrap();
        assert_eq!(assigned.lifecycle.phase, Phase::Implement);
        assert_eq!(assigned.lifecycle.assigned_session, Some("session-1".to_string()));
    }

    #[test]
    fn complete_writes_outcome_and_journal_entry() {
        let dir = TempDir::new().unwrap();
        let (intent, journal) = stores(&dir);
        let goal = intent.create(NewGoal { name: "Ship Lore".into(), ..Default::default() }).unwrap();
        let completed = intent.complete(&goal.id, OutcomeStatus::Completed, "shipped", &journal).unwrap();
        assert_eq!(completed.status, GoalStatus::Completed);
        assert!(completed.outcome.is_some());
        assert_eq!(journal.list(&crate::journal::ListFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn import_creates_goal_and_tagged_plan_decisions() {
        let dir = TempDir::new().unwrap();
        let (intent, journal) = stores(&dir);
        let spec = ImportedSpec {
            title: "Lore".into(),
            path: "specs/lore.md".into(),
            branch: Some("main".into()),
            user_stories: vec![ImportedUserStory { description: "record decisions".into(), acceptance_criteria: vec!["dedup works".into()] }],
            plan_decisions: vec![ImportedPlanDecision { decision: "Use JSONL".into(), rationale: "simple".into() }],
        };
        let goal = intent.import(spec, &journal).unwrap();
        assert_eq!(goal.success_criteria.len(), 1);
        assert_eq!(goal.lifecycle.plan_decisions.len(), 1);
        let decisions = journal.list(&crate::journal::ListFilter::default()).unwrap();
        assert!(decisions[0].tags.contains(&format!("spec:{}", goal.id)));
    }
}
