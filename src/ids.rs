//! Typed-prefix identifier generation and UTC timestamps.
//!
//! Every store's ID follows `<prefix>-<suffix>` (spec.md §3/§6). Decision,
//! pattern, anti-pattern, failure, and inbox IDs use a random 8-hex suffix;
//! session IDs embed a timestamp; goal IDs embed an epoch. Graph node IDs
//! are the one deterministic exception (`graph::node_id`), since they must
//! be a pure function of (type, name).

use chrono::{DateTime, Utc};
use rand::Rng;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

fn random_hex(bytes: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..bytes).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

pub fn decision_id() -> String {
    format!("dec-{}", random_hex(4))
}

pub fn pattern_id() -> String {
    format!("pat-{}", random_hex(4))
}

pub fn anti_pattern_id() -> String {
    format!("anti-{}", random_hex(4))
}

pub fn failure_id() -> String {
    format!("fail-{}", random_hex(4))
}

pub fn observation_id() -> String {
    format!("obs-{}", random_hex(4))
}

pub fn session_id() -> String {
    let ts = now().format("%Y%m%d-%H%M%S");
    format!("session-{}-{}", ts, random_hex(3))
}

pub fn goal_id() -> String {
    format!("goal-{}-{}", now().timestamp(), random_hex(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_the_expected_prefix() {
        assert!(decision_id().starts_with("dec-"));
        assert!(pattern_id().starts_with("pat-"));
        assert!(anti_pattern_id().starts_with("anti-"));
        assert!(failure_id().starts_with("fail-"));
        assert!(observation_id().starts_with("obs-"));
        assert!(session_id().starts_with("session-"));
        assert!(goal_id().starts_with("goal-"));
    }

    #[test]
    fn random_ids_are_distinct() {
        assert_ne!(decision_id(), decision_id());
    }
}
