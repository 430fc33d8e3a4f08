//! Append-only failure log (spec.md §4.4).

use crate::error::Result;
use crate::store::lock::SharedLock;
use crate::store::{fs as storefs, Paths};
use crate::ids;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub error_type: String,
    pub error_message: String,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
}

fn schema_version_default() -> u32 {
    1
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub error_type: Option<String>,
    pub session_id: Option<String>,
}

pub struct FailureStore {
    paths: Paths,
}

impl FailureStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn append(
        &self,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        tool: Option<String>,
        step: Option<String>,
        session_id: Option<String>,
    ) -> Result<Failure> {
        let failure = Failure {
            id: ids::failure_id(),
            timestamp: ids::now(),
            error_type: error_type.into(),
            error_message: error_message.into(),
            tool,
            step,
            session_id,
            schema_version: 1,
        };
        let _lock = SharedLock::acquire(&self.paths.failures_file())?;
        storefs::append_line(&self.paths.failures_file(), &failure)?;
        tracing::debug!(id = %failure.id, error_type = %failure.error_type, "recorded failure");
        Ok(failure)
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Failure>> {
        let mut out: Vec<Failure> = storefs::read_jsonl(&self.paths.failures_file())?;
        if let Some(t) = &filter.error_type {
            out.retain(|f| &f.error_type == t);
        }
        if let Some(s) = &filter.session_id {
            out.retain(|f| f.session_id.as_deref() == Some(s.as_str()));
        }
        Ok(out)
    }

    pub fn stats_by_type(&self) -> Result<HashMap<String, usize>> {
        let all: Vec<Failure> = storefs::read_jsonl(&self.paths.failures_file())?;
        let mut stats = HashMap::new();
        for f in all {
            *stats.entry(f.error_type).or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Rule of three (spec.md §4.3): error types that have recurred at
    /// least 3 times, as candidates for anti-pattern promotion. Advisory
    /// only — this never creates the anti-pattern itself.
    pub fn promotion_candidates(&self) -> Result<Vec<String>> {
        Ok(self
            .stats_by_type()?
            .into_iter()
            .filter(|(_, count)| *count >= 3)
            .map(|(error_type, _)| error_type)
            .collect())
    }
}
