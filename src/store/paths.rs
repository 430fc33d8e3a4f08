//! Resolves every on-disk location from a single data root (spec.md §6).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn decisions_file(&self) -> PathBuf {
        self.root.join("journal/data/decisions.jsonl")
    }

    pub fn journal_index_dir(&self) -> PathBuf {
        self.root.join("journal/data/index")
    }

    pub fn patterns_file(&self) -> PathBuf {
        self.root.join("patterns/data/patterns.yaml")
    }

    pub fn failures_file(&self) -> PathBuf {
        self.root.join("failures/data/failures.jsonl")
    }

    pub fn observations_file(&self) -> PathBuf {
        self.root.join("inbox/data/observations.jsonl")
    }

    pub fn observations_status_file(&self) -> PathBuf {
        self.root.join("inbox/data/observations.status.jsonl")
    }

    pub fn graph_file(&self) -> PathBuf {
        self.root.join("graph/data/graph.json")
    }

    pub fn goals_dir(&self) -> PathBuf {
        self.root.join("intent/data/goals")
    }

    pub fn goal_file(&self, goal_id: &str) -> PathBuf {
        self.goals_dir().join(format!("{goal_id}.yaml"))
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("transfer/data/sessions")
    }

    pub fn session_file(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.json"))
    }

    pub fn session_compressed_file(&self, session_id: &str) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.compressed.json"))
    }

    pub fn current_session_file(&self) -> PathBuf {
        self.root.join("transfer/data/.current_session")
    }

    pub fn search_db(&self) -> PathBuf {
        self.root.join("search.db")
    }

    pub fn project_marker(&self) -> &'static str {
        ".lore/project.yaml"
    }

    /// Create every directory this layout needs. Idempotent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [
            self.decisions_file().parent().unwrap().to_path_buf(),
            self.journal_index_dir(),
            self.patterns_file().parent().unwrap().to_path_buf(),
            self.failures_file().parent().unwrap().to_path_buf(),
            self.observations_file().parent().unwrap().to_path_buf(),
            self.graph_file().parent().unwrap().to_path_buf(),
            self.goals_dir(),
            self.sessions_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_spec_paths() {
        let p = Paths::new("/data");
        assert_eq!(p.decisions_file(), PathBuf::from("/data/journal/data/decisions.jsonl"));
        assert_eq!(p.patterns_file(), PathBuf::from("/data/patterns/data/patterns.yaml"));
        assert_eq!(p.graph_file(), PathBuf::from("/data/graph/data/graph.json"));
        assert_eq!(p.search_db(), PathBuf::from("/data/search.db"));
    }
}
