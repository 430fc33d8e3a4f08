//! Embedding provider client (SPEC_FULL.md §4.16). The service itself is an
//! out-of-scope external collaborator; this module is the blocking HTTP
//! client side of its `{model, prompt} -> {embedding: [f32; N]}` contract.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub trait Provider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Always fails. Hybrid/semantic retrieval degrades to lexical-only when
/// this is the configured provider (spec.md §9: "ship a null implementation").
pub struct NullProvider;

impl Provider for NullProvider {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::External("no embedding provider configured".to_string()))
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

pub struct HttpProvider {
    url: String,
    model: String,
    timeout: Duration,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>, model: impl Into<String>, timeout_ms: u64) -> Self {
        Self { url: url.into(), model: model.into(), timeout: Duration::from_millis(timeout_ms) }
    }
}

impl Provider for HttpProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest { model: &self.model, prompt: text };
        let response = ureq::post(&self.url)
            .timeout(self.timeout)
            .send_json(body)
            .map_err(|e| Error::External(format!("embedding request failed: {e}")))?;
        let parsed: EmbedResponse = response
            .into_json()
            .map_err(|e| Error::External(format!("malformed embedding response: {e}")))?;
        Ok(parsed.embedding)
    }
}
