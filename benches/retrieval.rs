//! Retrieval throughput at a few journal sizes (spec.md §8 performance
//! notes). Uses an in-memory index so the numbers reflect the ranking and
//! fusion cost, not disk I/O.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lore::embedding::NullProvider;
use lore::graph::GraphStore;
use lore::journal::{JournalStore, NewDecision};
use lore::pattern_store::PatternStore;
use lore::retrieval::{Mode, RetrievalEngine, RetrievalQuery, Sources};
use lore::search::SearchIndex;
use lore::store::Paths;
use lore::transfer::TransferEngine;
use tempfile::TempDir;

fn seeded_stores(dir: &TempDir, count: usize) -> (Paths, JournalStore, PatternStore, TransferEngine, GraphStore) {
    let paths = Paths::new(dir.path());
    paths.ensure_dirs().unwrap();
    let journal = JournalStore::new(paths.clone(), 0.70, 0.30);
    let patterns = PatternStore::new(paths.clone(), 0.70);
    let transfer = TransferEngine::new(paths.clone());
    let graph = GraphStore::new(paths.clone());

    for i in 0..count {
        journal
            .record(
                NewDecision {
                    decision: format!("Use strategy #{i} for handling retries in the worker pool"),
                    rationale: "observed transient failures under load".into(),
                    tags: vec![format!("batch-{}", i % 7)],
                    ..Default::default()
                },
                true,
            )
            .unwrap();
    }

    (paths, journal, patterns, transfer, graph)
}

fn bench_lexical_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexical_search");
    for size in [100, 1_000, 5_000] {
        let dir = TempDir::new().unwrap();
        let (_paths, journal, patterns, transfer, graph) = seeded_stores(&dir, size);
        let mut index = SearchIndex::open_in_memory().unwrap();
        index.build(&journal, &patterns, &transfer, &graph, &NullProvider).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| index.search_lexical_all("retries worker pool", None, 10).unwrap());
        });
    }
    group.finish();
}

fn bench_hybrid_search_without_an_embedder(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let (paths, journal, patterns, transfer, graph) = seeded_stores(&dir, 1_000);
    let mut index = SearchIndex::open_in_memory().unwrap();
    index.build(&journal, &patterns, &transfer, &graph, &NullProvider).unwrap();

    let engine = RetrievalEngine::new();
    let sources = Sources { journal: &journal, patterns: &patterns, transfer: &transfer, graph: &graph, embedder: &NullProvider, paths: &paths };

    c.bench_function("hybrid_search_degraded_to_lexical_1000_decisions", |b| {
        b.iter(|| {
            let query = RetrievalQuery { text: "retries worker pool".into(), mode: Mode::Hybrid, limit: 10, ..Default::default() };
            engine.search(&mut index, &sources, &query).unwrap()
        });
    });
}

criterion_group!(benches, bench_lexical_search, bench_hybrid_search_without_an_embedder);
criterion_main!(benches);
