//! Pattern catalogue (spec.md §4.3): a single YAML document holding
//! `patterns` and `anti_patterns`, mutated by atomic replace.

pub mod checks;
pub mod types;

use crate::error::{Error, Result};
use crate::store::lock::ExclusiveLock;
use crate::store::{fs as storefs, Paths};
use crate::{ids, spec_quality, text};
pub use checks::{check, CheckFinding};
pub use types::{AntiPattern, Category, NewAntiPattern, NewPattern, Pattern, PatternExamples, Severity};
use types::PatternDocument;

pub struct PatternStore {
    paths: Paths,
    dedup_threshold: f64,
}

impl PatternStore {
    pub fn new(paths: Paths, dedup_threshold: f64) -> Self {
        Self { paths, dedup_threshold }
    }

    fn read(&self) -> Result<PatternDocument> {
        storefs::read_yaml(&self.paths.patterns_file())
    }

    fn write(&self, doc: &PatternDocument) -> Result<()> {
        storefs::atomic_write_yaml(&self.paths.patterns_file(), doc)
    }

    pub fn capture(&self, input: NewPattern, force: bool) -> Result<Pattern> {
        let _lock = ExclusiveLock::acquire(&self.paths.patterns_file())?;
        let mut doc = self.read()?;

        if !force {
            if let Some(dup) = doc.patterns.iter().find(|p| {
                !p.deprecated && text::jaccard(&p.name, &input.name) >= self.dedup_threshold
            }) {
                return Err(Error::Conflict(format!(
                    "pattern resembles existing {} (similarity >= {:.2}); pass force to capture anyway",
                    dup.id, self.dedup_threshold
                )));
            }
        }

        let spec_quality = spec_quality::pattern_score(&input.name, &input.context, &input.solution, &input.problem);
        let pattern = Pattern {
            id: ids::pattern_id(),
            name: input.name,
            context: input.context,
            problem: input.problem,
            solution: input.solution,
            category: input.category.unwrap_or_default(),
            origin: input.origin,
            confidence: 0.5,
            validations: 0,
            created_at: ids::now(),
            spec_quality,
            examples: input.examples,
            deprecated: false,
            schema_version: 1,
        };

        doc.patterns.push(pattern.clone());
        self.write(&doc)?;
        tracing::debug!(id = %pattern.id, "captured pattern");
        Ok(pattern)
    }

    pub fn validate(&self, id: &str) -> Result<Pattern> {
        let _lock = ExclusiveLock::acquire(&self.paths.patterns_file())?;
        let mut doc = self.read()?;
        let pattern = doc
            .patterns
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound { kind: "pattern", id: id.to_string() })?;
        pattern.validations += 1;
        pattern.confidence = (pattern.confidence + 0.05).min(1.0);
        let updated = pattern.clone();
        self.write(&doc)?;
        Ok(updated)
    }

    pub fn deprecate(&self, id: &str) -> Result<Pattern> {
        let _lock = ExclusiveLock::acquire(&self.paths.patterns_file())?;
        let mut doc = self.read()?;
        let pattern = doc
            .patterns
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound { kind: "pattern", id: id.to_string() })?;
        pattern.deprecated = true;
        if !pattern.name.starts_with("[DEPRECATED]") {
            pattern.name = format!("[DEPRECATED] {}", pattern.name);
        }
        let updated = pattern.clone();
        self.write(&doc)?;
        Ok(updated)
    }

    pub fn warn(&self, input: NewAntiPattern) -> Result<AntiPattern> {
        let _lock = ExclusiveLock::acquire(&self.paths.patterns_file())?;
        let mut doc = self.read()?;
        let anti = AntiPattern {
            id: ids::anti_pattern_id(),
            name: input.name,
            symptom: input.symptom,
            risk: input.risk,
            fix: input.fix,
            category: input.category.unwrap_or_default(),
            severity: input.severity,
            created_at: ids::now(),
            schema_version: 1,
        };
        doc.anti_patterns.push(anti.clone());
        self.write(&doc)?;
        tracing::debug!(id = %anti.id, "warned anti-pattern");
        Ok(anti)
    }

    pub fn show(&self, id: &str) -> Result<Pattern> {
        self.read()?
            .patterns
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound { kind: "pattern", id: id.to_string() })
    }

    pub fn list(&self, category: Option<Category>) -> Result<Vec<Pattern>> {
        let doc = self.read()?;
        Ok(match category {
            Some(c) => doc.patterns.into_iter().filter(|p| p.category == c).collect(),
            None => doc.patterns,
        })
    }

    pub fn list_anti_patterns(&self) -> Result<Vec<AntiPattern>> {
        Ok(self.read()?.anti_patterns)
    }

    pub fn stale(&self) -> Result<Vec<Pattern>> {
        Ok(self.read()?.patterns.into_iter().filter(|p| p.is_stale() && !p.deprecated).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> PatternStore {
        PatternStore::new(Paths::new(dir.path()), 0.70)
    }

    fn input(name: &str) -> NewPattern {
        NewPattern {
            name: name.to_string(),
            context: "shell scripts doing arithmetic".into(),
            problem: "octal misinterpretation of zero-padded numbers".into(),
            solution: "use $(( 10#$n )) to force base 10".into(),
            ..Default::default()
        }
    }

    #[test]
    fn capture_then_show_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let p = store.capture(input("Safe bash arithmetic"), false).unwrap();
        let fetched = store.show(&p.id).unwrap();
        assert_eq!(fetched.confidence, 0.5);
        assert_eq!(fetched.validations, 0);
    }

    #[test]
    fn near_duplicate_is_rejected_without_force() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.capture(input("Safe bash arithmetic"), false).unwrap();
        let result = store.capture(input("Safe Bash arith"), false);
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn validate_raises_confidence_and_validation_count() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let p = store.capture(input("Safe bash arithmetic"), false).unwrap();
        let updated = store.validate(&p.id).unwrap();
        assert_eq!(updated.validations, 1);
        assert!((updated.confidence - 0.55).abs() < 1e-9);
    }

    #[test]
    fn deprecate_sets_flag_and_prefixes_name() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let p = store.capture(input("Safe bash arithmetic"), false).unwrap();
        let updated = store.deprecate(&p.id).unwrap();
        assert!(updated.deprecated);
        assert!(updated.name.starts_with("[DEPRECATED]"));
    }

    #[test]
    fn stale_reports_unvalidated_or_low_confidence_patterns() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.capture(input("Safe bash arithmetic"), false).unwrap();
        let stale = store.stale().unwrap();
        assert_eq!(stale.len(), 1);
    }
}
