//! File-based secondary indexes: one file per (dimension, value), holding
//! newline-separated decision IDs (spec.md §4.2, §6).

use crate::error::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn index_path(dir: &Path, dimension: &str, value: &str) -> PathBuf {
    match dimension {
        "date" => dir.join(format!("date_{}.idx", value)),
        "type" => dir.join(format!("type_{}.idx", safe(value))),
        "entity" => dir.join(format!("entity_{}.idx", safe(value))),
        "tag" => dir.join(format!("tag_{}.idx", safe(value))),
        other => dir.join(format!("{other}_{}.idx", safe(value))),
    }
}

/// Append `id` to the index file for (dimension, value) if not already
/// present. Append-then-dedup-on-read would also work; we dedup here so
/// each index file stays small.
pub fn add(dir: &Path, dimension: &str, value: &str, id: &str) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = index_path(dir, dimension, value);
    let mut ids: BTreeSet<String> = read(dir, dimension, value)?.into_iter().collect();
    if ids.insert(id.to_string()) {
        let body = ids.into_iter().collect::<Vec<_>>().join("\n");
        crate::store::fs::atomic_write(&path, format!("{body}\n").as_bytes())?;
    }
    Ok(())
}

pub fn read(dir: &Path, dimension: &str, value: &str) -> Result<Vec<String>> {
    let path = index_path(dir, dimension, value);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(&path)?;
    Ok(text.lines().filter(|l| !l.trim().is_empty()).map(|l| l.to_string()).collect())
}

/// Wipe every `*.idx` file in `dir`. Used by `compact` to rebuild from
/// scratch.
pub fn clear_all(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().extension().map(|e| e == "idx").unwrap_or(false) {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn add_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        add(dir.path(), "type", "architecture", "dec-1").unwrap();
        add(dir.path(), "type", "architecture", "dec-2").unwrap();
        add(dir.path(), "type", "architecture", "dec-1").unwrap(); // dup
        let ids = read(dir.path(), "type", "architecture").unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"dec-1".to_string()));
    }

    #[test]
    fn clear_all_removes_index_files_only() {
        let dir = TempDir::new().unwrap();
        add(dir.path(), "tag", "lore", "dec-1").unwrap();
        std::fs::write(dir.path().join("keepme.txt"), "x").unwrap();
        clear_all(dir.path()).unwrap();
        assert!(read(dir.path(), "tag", "lore").unwrap().is_empty());
        assert!(dir.path().join("keepme.txt").exists());
    }
}
