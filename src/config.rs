//! Layered configuration: compiled defaults, then `lore.toml` at the data
//! root, then `LORE_*` environment variables. Nothing else in the crate
//! reads the environment directly.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_root: PathBuf,
    pub embedding_url: Option<String>,
    pub embedding_model: String,
    pub embedding_timeout_ms: u64,
    pub embedding_dim: usize,
    pub dedup_threshold: f64,
    pub contradiction_threshold: f64,
    pub pending_decision_days: u32,
    pub subtraction_pending_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(".lore"),
            embedding_url: None,
            embedding_model: "text-embedding".to_string(),
            embedding_timeout_ms: 2_000,
            embedding_dim: 768,
            dedup_threshold: 0.70,
            contradiction_threshold: 0.30,
            pending_decision_days: 3,
            subtraction_pending_days: 14,
        }
    }
}

impl Config {
    /// Defaults rooted at a specific data directory; skips the file/env
    /// layers. Handy for tests and embedders that already know their root.
    pub fn default_for(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into(), ..Self::default() }
    }

    /// Full layered load: defaults -> `<data_root>/lore.toml` -> `LORE_*` env.
    pub fn load(data_root: impl Into<PathBuf>) -> Result<Self> {
        let data_root = data_root.into();
        let mut cfg = Self::default_for(&data_root);

        let toml_path = data_root.join("lore.toml");
        if toml_path.exists() {
            let text = std::fs::read_to_string(&toml_path)?;
            let file_cfg: PartialConfig = toml::from_str(&text)?;
            file_cfg.apply(&mut cfg);
        }

        apply_env(&mut cfg);
        cfg.data_root = data_root;
        Ok(cfg)
    }
}

/// Every field optional, so a `lore.toml` only needs to mention what it
/// overrides.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    embedding_url: Option<String>,
    embedding_model: Option<String>,
    embedding_timeout_ms: Option<u64>,
    embedding_dim: Option<usize>,
    dedup_threshold: Option<f64>,
    contradiction_threshold: Option<f64>,
    pending_decision_days: Option<u32>,
    subtraction_pending_days: Option<u32>,
}

impl PartialConfig {
    fn apply(self, cfg: &mut Config) {
        if let Some(v) = self.embedding_url { cfg.embedding_url = Some(v); }
        if let Some(v) = self.embedding_model { cfg.embedding_model = v; }
        if let Some(v) = self.embedding_timeout_ms { cfg.embedding_timeout_ms = v; }
        if let Some(v) = self.embedding_dim { cfg.embedding_dim = v; }
        if let Some(v) = self.dedup_threshold { cfg.dedup_threshold = v; }
        if let Some(v) = self.contradiction_threshold { cfg.contradiction_threshold = v; }
        if let Some(v) = self.pending_decision_days { cfg.pending_decision_days = v; }
        if let Some(v) = self.subtraction_pending_days { cfg.subtraction_pending_days = v; }
    }
}

fn apply_env(cfg: &mut Config) {
    if let Ok(v) = std::env::var("LORE_EMBEDDING_URL") { cfg.embedding_url = Some(v); }
    if let Ok(v) = std::env::var("LORE_EMBEDDING_MODEL") { cfg.embedding_model = v; }
    if let Ok(v) = std::env::var("LORE_EMBEDDING_TIMEOUT_MS") {
        if let Ok(n) = v.parse() { cfg.embedding_timeout_ms = n; }
    }
    if let Ok(v) = std::env::var("LORE_DATA_ROOT") { cfg.data_root = PathBuf::from(v); }
}

pub fn resolve_default_root() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".lore"))
        .unwrap_or_else(|| Path::new(".lore").to_path_buf())
}
