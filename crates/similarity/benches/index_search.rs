//! Benchmarks for the similarity index
//!
//! Run with: cargo bench --package similarity
//!
//! Uses a synthetic catalog sized like the reference deployment
//! (~10k movies, 384-dim embeddings).

use catalog::{CatalogStore, Embeddings, Movie};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use similarity::SimilarityIndex;
use std::sync::Arc;

const ROWS: usize = 10_000;
const DIM: usize = 384;

fn synthetic_index() -> SimilarityIndex {
    let mut rng = StdRng::seed_from_u64(42);

    let movies: Vec<Movie> = (0..ROWS as u32)
        .map(|id| Movie {
            id,
            title: format!("Movie {}", id),
            genres: "Drama".to_string(),
            overview: String::new(),
            release_date: String::new(),
            poster_path: String::new(),
            vote_count: rng.random_range(0..100_000),
            original_language: "en".to_string(),
            adult: false,
        })
        .collect();

    let data: Vec<f32> = (0..ROWS * DIM).map(|_| rng.random_range(-1.0..1.0)).collect();
    let embeddings = Embeddings::from_flat(DIM, data).expect("valid synthetic embeddings");

    SimilarityIndex::build(Arc::new(
        CatalogStore::new(movies, embeddings).expect("valid synthetic catalog"),
    ))
}

fn bench_score_all(c: &mut Criterion) {
    let index = synthetic_index();
    let query: Vec<f32> = {
        let mut rng = StdRng::seed_from_u64(7);
        let mut q: Vec<f32> = (0..DIM).map(|_| rng.random_range(-1.0..1.0)).collect();
        catalog::vector::normalize(&mut q);
        q
    };

    c.bench_function("score_all_10k_384d", |b| {
        b.iter(|| {
            let scores = index.score_all(black_box(&query)).unwrap();
            black_box(scores)
        })
    });
}

fn bench_search_top_12(c: &mut Criterion) {
    let index = synthetic_index();
    let query: Vec<f32> = {
        let mut rng = StdRng::seed_from_u64(7);
        let mut q: Vec<f32> = (0..DIM).map(|_| rng.random_range(-1.0..1.0)).collect();
        catalog::vector::normalize(&mut q);
        q
    };

    c.bench_function("search_top_12_10k_384d", |b| {
        b.iter(|| {
            let hits = index.search(black_box(&query), black_box(12)).unwrap();
            black_box(hits)
        })
    });
}

criterion_group!(benches, bench_score_all, bench_search_top_12);
criterion_main!(benches);
