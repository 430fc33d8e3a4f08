//! Spec-quality scoring (spec.md §3): a 0–1 completeness score computed at
//! write time and stored on the record. Never gates a write — see
//! SPEC_FULL.md §9 Open-Question resolution #2.

/// `0.2·(decision present) + 0.3·(rationale > 20 chars) + 0.2·(≥1 alternative)
/// + 0.15·(≥1 entity) + 0.15·(≥1 tag)`
pub fn decision_score(
    decision: &str,
    rationale: &str,
    alternatives: &[String],
    entities: &[String],
    tags: &[String],
) -> f64 {
    let mut score = 0.0;
    if !decision.trim().is_empty() {
        score += 0.2;
    }
    if rationale.len() > 20 {
        score += 0.3;
    }
    if !alternatives.is_empty() {
        score += 0.2;
    }
    if !entities.is_empty() {
        score += 0.15;
    }
    if !tags.is_empty() {
        score += 0.15;
    }
    score
}

/// `0.2·name + 0.3·context>10 + 0.3·solution>10 + 0.2·problem>10`
pub fn pattern_score(name: &str, context: &str, solution: &str, problem: &str) -> f64 {
    let mut score = 0.0;
    if !name.trim().is_empty() {
        score += 0.2;
    }
    if context.len() > 10 {
        score += 0.3;
    }
    if solution.len() > 10 {
        score += 0.3;
    }
    if problem.len() > 10 {
        score += 0.2;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_with_every_field_scores_one() {
        let score = decision_score(
            "Use JSONL over SQLite",
            "append-only, simple, no extra dep",
            &["SQLite".to_string()],
            &["JSONL".to_string(), "SQLite".to_string()],
            &["lore".to_string()],
        );
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decision_with_only_decision_field_scores_0_2() {
        let score = decision_score("Use JSONL over SQLite", "", &[], &[], &[]);
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn pattern_with_every_field_scores_one() {
        let score = pattern_score(
            "Safe bash arithmetic",
            "Shell scripts using unguarded arithmetic",
            "Use $(( )) with explicit base-10 parsing",
            "Arithmetic expansion can misinterpret octal input",
        );
        assert!((score - 1.0).abs() < 1e-9);
    }
}
