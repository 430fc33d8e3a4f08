//! SQLite schema for the search index (spec.md §4.8).

use crate::error::Result;
use rusqlite::Connection;

pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS decisions USING fts5(
            id UNINDEXED, content, project UNINDEXED, timestamp UNINDEXED,
            importance UNINDEXED
        );
        CREATE VIRTUAL TABLE IF NOT EXISTS patterns USING fts5(
            id UNINDEXED, content, project UNINDEXED, timestamp UNINDEXED,
            importance UNINDEXED
        );
        CREATE VIRTUAL TABLE IF NOT EXISTS transfers USING fts5(
            id UNINDEXED, content, project UNINDEXED, timestamp UNINDEXED,
            importance UNINDEXED
        );
        CREATE TABLE IF NOT EXISTS access_log (
            record_type TEXT NOT NULL,
            record_id TEXT NOT NULL,
            accessed_at TEXT NOT NULL,
            PRIMARY KEY (record_type, record_id, accessed_at)
        );
        CREATE TABLE IF NOT EXISTS embeddings (
            record_type TEXT NOT NULL,
            record_id TEXT NOT NULL,
            content_text TEXT NOT NULL,
            embedding_vec BLOB NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (record_type, record_id)
        );
        CREATE TABLE IF NOT EXISTS graph_nodes (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS graph_edges (
            from_id TEXT NOT NULL,
            to_id TEXT NOT NULL,
            relation TEXT NOT NULL,
            weight REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS graph_edges_from ON graph_edges(from_id);
        CREATE INDEX IF NOT EXISTS graph_edges_to ON graph_edges(to_id);
        ",
    )?;
    Ok(())
}

/// Drops and recreates the three FTS tables; used at the start of `build`
/// so rebuilds are idempotent regardless of what `init` already created.
pub fn reset_fts_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS decisions;
        DROP TABLE IF EXISTS patterns;
        DROP TABLE IF EXISTS transfers;
        ",
    )?;
    init(conn)
}
