//! Composite ranking formula (spec.md §4.8). Weights and formula shape are
//! part of the public contract (spec.md §9) and are pinned by the tests
//! below.

/// `1 / (1 + days_since / 30)`
pub fn temporal_decay(days_since: f64) -> f64 {
    1.0 / (1.0 + days_since / 30.0)
}

/// `1 + ln(1 + access_count) * 0.15`
pub fn freq_boost(access_count: u64) -> f64 {
    1.0 + ((1.0 + access_count as f64).ln()) * 0.15
}

/// `1 + importance / 5 * 0.2`
pub fn importance_boost(importance: f64) -> f64 {
    1.0 + importance / 5.0 * 0.2
}

/// `1 + 0.1 * exp(-days_since_last_access / 30)`
pub fn recency_access_boost(days_since_last_access: f64) -> f64 {
    1.0 + 0.1 * (-days_since_last_access / 30.0).exp()
}

/// `1.5` if the record's project matches the query's project, else `1.0`.
pub fn project_boost(record_project: Option<&str>, query_project: Option<&str>) -> f64 {
    match (record_project, query_project) {
        (Some(a), Some(b)) if a == b => 1.5,
        _ => 1.0,
    }
}

pub struct RankInputs {
    pub bm25: f64,
    pub days_since_timestamp: f64,
    pub access_count: u64,
    pub importance: f64,
    pub days_since_last_access: Option<f64>,
    pub record_project: Option<String>,
    pub query_project: Option<String>,
}

/// `bm25 * temporal_decay * freq_boost * importance_boost *
/// recency_access_boost * project_boost`.
pub fn composite_score(inputs: &RankInputs) -> f64 {
    inputs.bm25
        * temporal_decay(inputs.days_since_timestamp)
        * freq_boost(inputs.access_count)
        * importance_boost(inputs.importance)
        * recency_access_boost(inputs.days_since_last_access.unwrap_or(f64::MAX))
        * project_boost(inputs.record_project.as_deref(), inputs.query_project.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporal_decay_is_one_at_zero_days() {
        assert!((temporal_decay(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn temporal_decay_halves_at_thirty_days() {
        assert!((temporal_decay(30.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn freq_boost_is_one_with_no_access() {
        assert!((freq_boost(0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn importance_boost_caps_at_expected_value_for_max_importance() {
        assert!((importance_boost(5.0) - 1.2).abs() < 1e-9);
    }

    #[test]
    fn project_boost_rewards_matching_project() {
        assert_eq!(project_boost(Some("lore"), Some("lore")), 1.5);
        assert_eq!(project_boost(Some("lore"), Some("other")), 1.0);
        assert_eq!(project_boost(None, Some("other")), 1.0);
    }

    #[test]
    fn composite_score_is_the_product_of_every_factor() {
        let inputs = RankInputs {
            bm25: 2.0,
            days_since_timestamp: 0.0,
            access_count: 0,
            importance: 0.0,
            days_since_last_access: None,
            record_project: None,
            query_project: None,
        };
        // temporal=1, freq=1, importance=1, recency~=1 (huge days), project=1
        assert!((composite_score(&inputs) - 2.0).abs() < 1e-6);
    }
}
