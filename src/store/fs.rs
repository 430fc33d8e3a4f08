//! Atomic replace and append-only helpers shared by every store.
//!
//! Every mutation of a JSON/YAML document uses [`atomic_write`]
//! (write-to-temp-in-same-directory, then rename). Every append to a JSONL
//! log uses [`append_line`] (`O_APPEND`, one write per record). Readers
//! tolerate a trailing partial line, per spec.md §4.2's failure semantics.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Write `bytes` to `<path>.tmp-<pid>-<nanos>` in the same directory, then
/// rename over `path`. Same-directory temp file keeps the rename on one
/// filesystem, so it is atomic.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().ok_or_else(|| {
        crate::error::Error::Fatal(format!("{path:?} has no parent directory"))
    })?;
    std::fs::create_dir_all(dir)?;
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let tmp = dir.join(format!(
        ".{}.tmp-{}-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("lore"),
        std::process::id(),
        nanos
    ));
    {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &bytes)
}

pub fn atomic_write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_yaml::to_string(value)?;
    atomic_write(path, text.as_bytes())
}

/// Append one JSON-encoded record plus a trailing newline. Missing parent
/// directories are created; missing files are created.
pub fn append_line<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(line.as_bytes())?;
    Ok(())
}

/// Read every complete JSON line in `path`. A missing file reads as empty.
/// A trailing line that fails to parse is treated as a partial write and
/// silently discarded (only the *last* line is forgiven this way).
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        match serde_json::from_str::<T>(line) {
            Ok(record) => out.push(record),
            Err(_) if i == lines.len() - 1 => {
                // Tolerate a partial trailing line from a killed writer.
            }
            Err(e) => return Err(crate::error::Error::Integrity(format!("line {i}: {e}"))),
        }
    }
    Ok(out)
}

pub fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}
