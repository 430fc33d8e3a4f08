//! Session-handoff transfer layer (spec.md §4.6): `init -> snapshot* ->
//! handoff -> resume* / compress` over one JSON file per session.

pub mod types;

use crate::error::{Error, Result};
use crate::ids;
use crate::store::{fs as storefs, Paths};
pub use types::{GitState, Handoff, Related, Session, SessionContext};

pub struct TransferEngine {
    paths: Paths,
}

impl TransferEngine {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    fn read_session(&self, id: &str) -> Result<Session> {
        let path = self.paths.session_file(id);
        if !path.exists() {
            return Err(Error::NotFound { kind: "session", id: id.to_string() });
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write_session(&self, session: &Session) -> Result<()> {
        storefs::atomic_write_json(&self.paths.session_file(&session.id), session)
    }

    fn current_session_id(&self) -> Result<Option<String>> {
        let path = self.paths.current_session_file();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        let trimmed = text.trim();
        Ok(if trimmed.is_empty() { None } else { Some(trimmed.to_string()) })
    }

    fn set_current_session(&self, id: Option<&str>) -> Result<()> {
        storefs::atomic_write(&self.paths.current_session_file(), id.unwrap_or("").as_bytes())
    }

    /// `nonexistent -> active`: writes a fresh session record and points
    /// the current-session tracker at it.
    pub fn init(&self) -> Result<Session> {
        let session = Session {
            id: ids::session_id(),
            started_at: ids::now(),
            ended_at: None,
            summary: None,
            goals_addressed: Vec::new(),
            decisions_made: Vec::new(),
            patterns_learned: Vec::new(),
            open_threads: Vec::new(),
            handoff: None,
            git_state: None,
            context: SessionContext::default(),
            related: Related::default(),
            compressed: false,
            compressed_at: None,
            schema_version: 1,
        };
        self.write_session(&session)?;
        self.set_current_session(Some(&session.id))?;
        tracing::info!(id = %session.id, "session initialized");
        Ok(session)
    }

    /// `active -> snapshot(summary) -> active`: captures git state and
    /// recently-modified active files; a missing/unavailable `git` binary
    /// degrades to a zeroed `GitState` rather than failing the snapshot.
    pub fn snapshot(&self, session_id: &str, summary: impl Into<String>, cwd: &std::path::Path) -> Result<Session> {
        let mut session = self.read_session(session_id)?;
        session.summary = Some(summary.into());
        session.git_state = Some(capture_git_state(cwd));
        session.context.active_files = discover_active_files(cwd);
        self.write_session(&session)?;
        tracing::debug!(id = %session.id, "snapshot captured");
        Ok(session)
    }

    /// `active -> handoff(...) -> ended`: stamps `ended_at`, records the
    /// handoff block, and clears the current-session tracker.
    pub fn handoff(
        &self,
        session_id: &str,
        message: impl Into<String>,
        next_steps: Vec<String>,
        blockers: Vec<String>,
        questions: Vec<String>,
    ) -> Result<Session> {
        let mut session = self.read_session(session_id)?;
        session.ended_at = Some(ids::now());
        session.handoff = Some(Handoff {
            message: message.into(),
            next_steps,
            blockers,
            questions,
            created_at: ids::now(),
        });
        self.write_session(&session)?;
        if self.current_session_id()?.as_deref() == Some(session_id) {
            self.set_current_session(None)?;
        }
        tracing::info!(id = %session.id, "session handed off");
        Ok(session)
    }

    /// Pure read: loads `id`, or the current session if unspecified. Never
    /// mutates.
    pub fn resume(&self, id: Option<&str>) -> Result<Session> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.current_session_id()?.ok_or_else(|| Error::NotFound { kind: "session", id: "current".to_string() })?,
        };
        self.read_session(&id)
    }

    /// `ended -> compress(id) -> ended(compressed=true)`: writes a
    /// `.compressed.` sibling file keeping handoff/summary/decisions/
    /// patterns/open_threads/active_files; drops recent_commands and the
    /// full environment map. Returns the compressed session.
    pub fn compress(&self, session_id: &str) -> Result<Session> {
        let mut session = self.read_session(session_id)?;
        session.context.recent_commands.clear();
        session.context.environment.clear();
        session.compressed = true;
        session.compressed_at = Some(ids::now());
        storefs::atomic_write_json(&self.paths.session_compressed_file(session_id), &session)?;
        self.write_session(&session)?;
        tracing::debug!(id = %session.id, "session compressed");
        Ok(session)
    }

    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        let dir = self.paths.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".compressed.json") || !name.ends_with(".json") {
                continue;
            }
            let text = std::fs::read_to_string(entry.path())?;
            out.push(serde_json::from_str(&text)?);
        }
        Ok(out)
    }
}

/// Shells out to `git`. Any failure (not a repo, binary missing) degrades
/// to a zeroed state — an External failure, non-fatal per spec.md §7.
fn capture_git_state(cwd: &std::path::Path) -> GitState {
    let branch = run_git(cwd, &["rev-parse", "--abbrev-ref", "HEAD"]);
    let uncommitted = run_git(cwd, &["status", "--porcelain"])
        .map(|out| out.lines().filter(|l| !l.trim().is_empty()).count() as u32)
        .unwrap_or(0);
    let stash_count = run_git(cwd, &["stash", "list"])
        .map(|out| out.lines().filter(|l| !l.trim().is_empty()).count() as u32)
        .unwrap_or(0);
    let commits = run_git(cwd, &["rev-list", "--count", "HEAD"])
        .and_then(|out| out.trim().parse().ok())
        .unwrap_or(0);
    GitState { branch, commits, uncommitted, stash_count }
}

fn run_git(cwd: &std::path::Path, args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

/// Files under `cwd` modified within the last 24 hours.
fn discover_active_files(cwd: &std::path::Path) -> Vec<String> {
    let cutoff = std::time::SystemTime::now() - std::time::Duration::from_secs(24 * 3600);
    walkdir::WalkDir::new(cwd)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.metadata().ok().and_then(|m| m.modified().ok()).map(|t| t >= cutoff).unwrap_or(false)
        })
        .map(|e| e.path().display().to_string())
        .collect()
}
