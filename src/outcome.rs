//! Outcome & feedback loop (spec.md §4.11): lists stale pending decisions
//! and resolves them, propagating side effects into the pattern store and
//! failure log.

use crate::error::{Error, Result};
use crate::failure::FailureStore;
use crate::journal::{Decision, DecisionOutcome, DecisionStatus, JournalStore, ListFilter};
use crate::pattern_store::PatternStore;
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Successful,
    Revised,
    Abandoned,
}

pub struct OutcomeEngine<'a> {
    journal: &'a JournalStore,
    patterns: &'a PatternStore,
    failures: &'a FailureStore,
}

impl<'a> OutcomeEngine<'a> {
    pub fn new(journal: &'a JournalStore, patterns: &'a PatternStore, failures: &'a FailureStore) -> Self {
        Self { journal, patterns, failures }
    }

    /// Active decisions with `outcome=pending` older than `older_than_days`,
    /// oldest first.
    pub fn list_pending(&self, older_than_days: u32) -> Result<Vec<Decision>> {
        let cutoff = Utc::now() - chrono::Duration::days(older_than_days as i64);
        let mut pending: Vec<Decision> = self
            .journal
            .list(&ListFilter { outcome: Some(DecisionOutcome::Pending), ..Default::default() })?
            .into_iter()
            .filter(|d| d.status == DecisionStatus::Active && d.timestamp <= cutoff)
            .collect();
        pending.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(pending)
    }

    /// Updates the decision's outcome, then runs the outcome-specific side
    /// effect named in spec.md §4.11: `successful` validates every pattern
    /// whose name/context/solution mentions an entity of this decision;
    /// `abandoned` writes a failure with `error_type="AbandonedDecision"`;
    /// `revised` has no side effect beyond the update.
    pub fn resolve(&self, id: &str, outcome: Outcome, lesson: Option<String>) -> Result<Decision> {
        let current = self.journal.get(id)?;
        if current.outcome != DecisionOutcome::Pending {
            return Err(Error::Conflict(format!(
                "decision {id} is not pending (outcome={:?})",
                current.outcome
            )));
        }

        let new_outcome = match outcome {
            Outcome::Successful => DecisionOutcome::Successful,
            Outcome::Revised => DecisionOutcome::Revised,
            Outcome::Abandoned => DecisionOutcome::Abandoned,
        };
        let updated = self.journal.update(id, |d| {
            d.outcome = new_outcome;
            if let Some(lesson) = &lesson {
                d.lesson_learned = Some(lesson.clone());
            }
        })?;

        match outcome {
            Outcome::Successful => self.validate_matching_patterns(&updated)?,
            Outcome::Abandoned => {
                self.failures.append(
                    "AbandonedDecision",
                    format!("abandoned: {}", updated.decision),
                    None,
                    None,
                    updated.session_id.clone(),
                )?;
            }
            Outcome::Revised => {}
        }

        tracing::info!(id = %updated.id, outcome = ?outcome, "resolved decision outcome");
        Ok(updated)
    }

    fn validate_matching_patterns(&self, decision: &Decision) -> Result<()> {
        if decision.entities.is_empty() {
            return Ok(());
        }
        for pattern in self.patterns.list(None)? {
            let haystack = format!("{} {} {}", pattern.name, pattern.context, pattern.solution).to_lowercase();
            let matches = decision.entities.iter().any(|e| haystack.contains(&e.to_lowercase()));
            if matches {
                self.patterns.validate(&pattern.id)?;
            }
        }
        Ok(())
    }
}
