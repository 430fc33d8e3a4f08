//! Full-text + vector search index (spec.md §4.8): a `rusqlite` database
//! with FTS5 tables, rebuilt on demand and queried with a composite
//! multiplicative ranking formula.

pub mod rank;
pub mod schema;

use crate::embedding::Provider;
use crate::error::Result;
use crate::graph::GraphStore;
use crate::ids;
use crate::journal::JournalStore;
use crate::pattern_store::PatternStore;
use crate::store::Paths;
use crate::transfer::TransferEngine;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record_type: String,
    pub record_id: String,
    pub content_prefix: String,
    pub project: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

pub struct SearchIndex {
    conn: Connection,
}

impl SearchIndex {
    pub fn open(paths: &Paths) -> Result<Self> {
        let conn = Connection::open(paths.search_db())?;
        schema::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn exists(paths: &Paths) -> bool {
        paths.search_db().exists()
    }

    /// Idempotent rebuild (spec.md §4.8 six-step ingest). Embedding
    /// failures are logged and skipped, never fatal.
    pub fn build(
        &mut self,
        journal: &JournalStore,
        patterns: &PatternStore,
        transfer: &TransferEngine,
        graph: &GraphStore,
        embedder: &dyn Provider,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        schema::reset_fts_tables(&tx)?;

        for decision in journal.list(&crate::journal::ListFilter::default())? {
            let project = decision.tags.first().cloned().unwrap_or_else(|| "default".to_string());
            let importance = if decision.lesson_learned.is_some() { 4.0 } else { 3.0 };
            tx.execute(
                "INSERT INTO decisions (id, content, project, timestamp, importance) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![decision.id, format!("{} {}", decision.decision, decision.rationale), project, decision.timestamp.to_rfc3339(), importance],
            )?;
        }

        for pattern in patterns.list(None)? {
            let importance = (pattern.confidence * 5.0).round();
            tx.execute(
                "INSERT INTO patterns (id, content, project, timestamp, importance) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![pattern.id, format!("{} {} {}", pattern.name, pattern.context, pattern.solution), Option::<String>::None, pattern.created_at.to_rfc3339(), importance],
            )?;
        }
        for anti in patterns.list_anti_patterns()? {
            tx.execute(
                "INSERT INTO patterns (id, content, project, timestamp, importance) VALUES (?1, ?2, ?3, ?4, 2.5)",
                params![anti.id, format!("ANTI: {} {} {}", anti.name, anti.symptom, anti.fix), Option::<String>::None, anti.created_at.to_rfc3339()],
            )?;
        }

        for session in transfer.list_sessions()? {
            if session.compressed {
                continue;
            }
            if let Some(handoff) = &session.handoff {
                tx.execute(
                    "INSERT INTO transfers (id, content, project, timestamp, importance) VALUES (?1, ?2, ?3, ?4, 3)",
                    params![session.id, handoff.message, Option::<String>::None, session.started_at.to_rfc3339()],
                )?;
            }
        }

        // Step 5: embed records lacking a vector. Best-effort.
        let rows: Vec<(String, String, String)> = {
            let mut stmt = tx.prepare("SELECT 'decision', id, content FROM decisions UNION ALL SELECT 'pattern', id, content FROM patterns")?;
            let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };
        for (record_type, record_id, content) in rows {
            let already: Option<String> = tx
                .query_row("SELECT record_id FROM embeddings WHERE record_type=?1 AND record_id=?2", params![record_type, record_id], |r| r.get(0))
                .optional()?;
            if already.is_some() {
                continue;
            }
            if let Ok(vec) = embedder.embed(&content) {
                let bytes: Vec<u8> = vec.iter().flat_map(|f| f.to_le_bytes()).collect();
                tx.execute(
                    "INSERT INTO embeddings (record_type, record_id, content_text, embedding_vec, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![record_type, record_id, content, bytes, ids::now().to_rfc3339()],
                )?;
            }
        }

        // Step 6: mirror the graph for traversal.
        tx.execute("DELETE FROM graph_nodes", [])?;
        tx.execute("DELETE FROM graph_edges", [])?;
        for node in graph.list_by_type(crate::graph::NodeType::Concept)?
            .into_iter()
            .chain(graph.list_by_type(crate::graph::NodeType::File)?)
            .chain(graph.list_by_type(crate::graph::NodeType::Pattern)?)
            .chain(graph.list_by_type(crate::graph::NodeType::Lesson)?)
            .chain(graph.list_by_type(crate::graph::NodeType::Decision)?)
            .chain(graph.list_by_type(crate::graph::NodeType::Session)?)
            .chain(graph.list_by_type(crate::graph::NodeType::Project)?)
        {
            let data = serde_json::to_string(&node.data)?;
            tx.execute(
                "INSERT OR REPLACE INTO graph_nodes (id, type, name, data, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![node.id, node.node_type.as_str(), node.name, data, node.created_at.to_rfc3339()],
            )?;
            for edge in graph.outgoing(&node.id)? {
                tx.execute(
                    "INSERT INTO graph_edges (from_id, to_id, relation, weight) VALUES (?1, ?2, ?3, ?4)",
                    params![edge.from, edge.to, format!("{:?}", edge.relation), edge.weight],
                )?;
                if edge.bidirectional {
                    tx.execute(
                        "INSERT INTO graph_edges (from_id, to_id, relation, weight) VALUES (?1, ?2, ?3, ?4)",
                        params![edge.to, edge.from, format!("{:?}", edge.relation), edge.weight],
                    )?;
                }
            }
        }

        tx.commit()?;
        tracing::info!("search index rebuilt");
        Ok(())
    }

    fn log_access(&self, record_type: &str, record_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO access_log (record_type, record_id, accessed_at) VALUES (?1, ?2, ?3)",
            params![record_type, record_id, ids::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn access_stats(&self, record_type: &str, record_id: &str) -> Result<(u64, Option<f64>)> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM access_log WHERE record_type=?1 AND record_id=?2",
            params![record_type, record_id],
            |r| r.get(0),
        )?;
        let last: Option<String> = self.conn.query_row(
            "SELECT MAX(accessed_at) FROM access_log WHERE record_type=?1 AND record_id=?2",
            params![record_type, record_id],
            |r| r.get(0),
        )?;
        let days_since_last = last
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| (Utc::now() - t.with_timezone(&Utc)).num_seconds() as f64 / 86_400.0);
        Ok((count, days_since_last))
    }

    /// Lexical (BM25) search over one FTS table, composed with the
    /// multiplicative ranking formula in spec.md §4.8.
    pub fn search_lexical(&self, table: &str, query: &str, project: Option<&str>, limit: usize) -> Result<Vec<SearchHit>> {
        let sql = format!("SELECT id, content, project, timestamp, importance, bm25({table}) FROM {table} WHERE {table} MATCH ?1 ORDER BY bm25({table}) LIMIT ?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![query, limit as i64 * 4], |r| {
            let id: String = r.get(0)?;
            let content: String = r.get(1)?;
            let proj: Option<String> = r.get(2)?;
            let ts: String = r.get(3)?;
            let importance: f64 = r.get(4)?;
            let bm25: f64 = r.get(5)?;
            Ok((id, content, proj, ts, importance, bm25))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, content, proj, ts, importance, bm25) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&ts).map(|t| t.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now());
            let days_since = (Utc::now() - timestamp).num_seconds() as f64 / 86_400.0;
            let (access_count, days_since_last_access) = self.access_stats(table, &id)?;
            let score = rank::composite_score(&rank::RankInputs {
                bm25: -bm25,
                days_since_timestamp: days_since.max(0.0),
                access_count,
                importance,
                days_since_last_access,
                record_project: proj.clone(),
                query_project: project.map(str::to_string),
            });
            hits.push(SearchHit {
                record_type: table.to_string(),
                record_id: id,
                content_prefix: content.chars().take(120).collect(),
                project: proj,
                timestamp,
                score,
            });
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(limit);
        for hit in &hits {
            self.log_access(&hit.record_type, &hit.record_id)?;
        }
        Ok(hits)
    }

    pub fn search_lexical_all(&self, query: &str, project: Option<&str>, limit: usize) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::new();
        for table in ["decisions", "patterns", "transfers"] {
            hits.extend(self.search_lexical(table, query, project, limit)?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }

    /// Cosine similarity against every stored embedding. O(n); acceptable
    /// at anticipated scale (spec.md §4.8).
    pub fn search_semantic(&self, query_vec: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let mut stmt = self.conn.prepare("SELECT record_type, record_id, content_text, embedding_vec FROM embeddings")?;
        let rows = stmt.query_map([], |r| {
            let record_type: String = r.get(0)?;
            let record_id: String = r.get(1)?;
            let content: String = r.get(2)?;
            let blob: Vec<u8> = r.get(3)?;
            Ok((record_type, record_id, content, blob))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (record_type, record_id, content, blob) = row?;
            let vec: Vec<f32> = blob.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
            let score = cosine_similarity(query_vec, &vec);
            hits.push(SearchHit {
                record_type,
                record_id,
                content_prefix: content.chars().take(120).collect(),
                project: None,
                timestamp: Utc::now(),
                score,
            });
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }

    /// RRF fusion of lexical and semantic rankings at `K=60` over a wider
    /// top-K from each.
    pub fn search_hybrid(&self, query: &str, query_vec: Option<&[f32]>, project: Option<&str>, limit: usize) -> Result<Vec<SearchHit>> {
        const WIDE_K: usize = 20;
        let lexical = self.search_lexical_all(query, project, WIDE_K)?;
        let semantic = match query_vec {
            Some(v) => self.search_semantic(v, WIDE_K)?,
            None => Vec::new(),
        };
        Ok(rrf_fuse(&[lexical, semantic], limit))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)) as f64
    }
}

/// `fused_score = Σ 1/(K+rank_i)`, K=60 (spec.md §4.8/glossary).
pub fn rrf_fuse(rankings: &[Vec<SearchHit>], limit: usize) -> Vec<SearchHit> {
    const K: f64 = 60.0;
    let mut scores: std::collections::HashMap<(String, String), (f64, SearchHit)> = std::collections::HashMap::new();
    for ranking in rankings {
        for (rank, hit) in ranking.iter().enumerate() {
            let key = (hit.record_type.clone(), hit.record_id.clone());
            let contribution = 1.0 / (K + rank as f64 + 1.0);
            scores
                .entry(key)
                .and_modify(|(score, _)| *score += contribution)
                .or_insert_with(|| (contribution, hit.clone()));
        }
    }
    let mut fused: Vec<SearchHit> = scores
        .into_values()
        .map(|(score, mut hit)| {
            hit.score = score;
            hit
        })
        .collect();
    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    fused.truncate(limit);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::NullProvider;
    use crate::journal::NewDecision;
    use tempfile::TempDir;

    #[test]
    fn build_then_lexical_search_finds_a_decision() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let journal = JournalStore::new(paths.clone(), 0.70, 0.30);
        journal.record(NewDecision { decision: "Use rusqlite for full-text search".into(), rationale: "bundled FTS5".into(), ..Default::default() }, false).unwrap();
        let patterns = PatternStore::new(paths.clone(), 0.70);
        let transfer = TransferEngine::new(paths.clone());
        let graph = GraphStore::new(paths.clone());

        let mut index = SearchIndex::open_in_memory().unwrap();
        index.build(&journal, &patterns, &transfer, &graph, &NullProvider).unwrap();

        let hits = index.search_lexical_all("rusqlite", None, 5).unwrap();
        assert!(!hits.is_empty());
    }

    #[test]
    fn rrf_fusion_of_identical_rankings_equals_either_ranking() {
        let hit = |id: &str| SearchHit {
            record_type: "decisions".to_string(),
            record_id: id.to_string(),
            content_prefix: String::new(),
            project: None,
            timestamp: Utc::now(),
            score: 0.0,
        };
        let ranking = vec![hit("a"), hit("b"), hit("c")];
        let fused = rrf_fuse(&[ranking.clone(), ranking.clone()], 3);
        let fused_ids: Vec<&str> = fused.iter().map(|h| h.record_id.as_str()).collect();
        assert_eq!(fused_ids, vec!["a", "b", "c"]);
    }
}
