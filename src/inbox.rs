//! Staging area for raw observations (spec.md §4.12): an append-only log
//! plus a status-overlay file, so `promote`/`discard` never rewrite the log.

use crate::error::{Error, Result};
use crate::ids;
use crate::store::lock::SharedLock;
use crate::store::{fs as storefs, Paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationStatus {
    Raw,
    Promoted,
    Discarded,
}

impl Default for ObservationStatus {
    fn default() -> Self {
        ObservationStatus::Raw
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
    pub content: String,
    #[serde(default)]
    pub status: ObservationStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
}

fn schema_version_default() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatusChange {
    id: String,
    status: ObservationStatus,
    changed_at: DateTime<Utc>,
}

pub struct Inbox {
    paths: Paths,
}

impl Inbox {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn observe(&self, content: impl Into<String>, source: Option<String>, tags: Vec<String>) -> Result<Observation> {
        let observation = Observation {
            id: ids::observation_id(),
            timestamp: ids::now(),
            source,
            content: content.into(),
            status: ObservationStatus::Raw,
            tags,
            schema_version: 1,
        };
        let _lock = SharedLock::acquire(&self.paths.observations_file())?;
        storefs::append_line(&self.paths.observations_file(), &observation)?;
        tracing::debug!(id = %observation.id, "recorded observation");
        Ok(observation)
    }

    fn status_overlay(&self) -> Result<HashMap<String, ObservationStatus>> {
        let changes: Vec<StatusChange> = storefs::read_jsonl(&self.paths.observations_status_file())?;
        let mut overlay = HashMap::new();
        for change in changes {
            overlay.insert(change.id, change.status);
        }
        Ok(overlay)
    }

    pub fn list(&self, status: Option<ObservationStatus>) -> Result<Vec<Observation>> {
        let overlay = self.status_overlay()?;
        let mut observations: Vec<Observation> = storefs::read_jsonl(&self.paths.observations_file())?;
        for obs in observations.iter_mut() {
            if let Some(s) = overlay.get(&obs.id) {
                obs.status = *s;
            }
        }
        Ok(match status {
            Some(s) => observations.into_iter().filter(|o| o.status == s).collect(),
            None => observations,
        })
    }

    fn set_status(&self, id: &str, status: ObservationStatus) -> Result<()> {
        let exists = self.list(None)?.iter().any(|o| o.id == id);
        if !exists {
            return Err(Error::NotFound { kind: "observation", id: id.to_string() });
        }
        let change = StatusChange { id: id.to_string(), status, changed_at: ids::now() };
        let _lock = SharedLock::acquire(&self.paths.observations_status_file())?;
        storefs::append_line(&self.paths.observations_status_file(), &change)
    }

    /// Marks the observation promoted. Does not create the target entry —
    /// the caller is responsible for recording the decision/pattern/etc.
    pub fn promote(&self, id: &str) -> Result<()> {
        self.set_status(id, ObservationStatus::Promoted)
    }

    pub fn discard(&self, id: &str) -> Result<()> {
        self.set_status(id, ObservationStatus::Discarded)
    }
}
