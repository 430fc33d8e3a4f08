//! Centralized error taxonomy for every Lore store and engine operation.
//!
//! Variants map onto the error kinds in the design spec: `Usage`, `NotFound`,
//! `Conflict`, `Integrity`, `External`, `Fatal`. `Integrity` and `External`
//! are meant to be handled locally by callers (skip a corrupt line, fall
//! back to lexical search); the rest propagate to the caller as `Err`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad arguments, missing required field, unknown enum value.
    #[error("usage error: {0}")]
    Usage(String),

    /// The addressed record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Dedup refusal, or an invalid state transition (e.g. resolving a
    /// non-pending decision).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A corrupted or partial record was skipped on read.
    #[error("integrity: {0}")]
    Integrity(String),

    /// An external collaborator (embedding service, registry) misbehaved.
    #[error("external: {0}")]
    External(String),

    /// I/O failure during a store mutation. Never leaves a half-written
    /// file thanks to atomic replace.
    #[error("fatal: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Exit-code mapping for an external CLI/daemon layer: success is 0,
/// everything here is 1. Kept as a single function so the mapping stays in
/// one place if it ever needs to become non-uniform.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Usage(_) | Error::NotFound { .. } | Error::Conflict(_) => 1,
        Error::Integrity(_) | Error::External(_) | Error::Fatal(_) => 1,
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Fatal(format!("I/O error: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Integrity(format!("JSON error: {err}"))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Integrity(format!("YAML error: {err}"))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Fatal(format!("database error: {err}"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Usage(format!("config error: {err}"))
    }
}
