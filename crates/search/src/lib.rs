//! # Search Crate
//!
//! Hybrid search for a single free-text query: a cheap keyword pass over the
//! whole catalog, plus a conditional semantic pass through the query
//! embedding cache and the similarity index.
//!
//! ## Merge strategy
//!
//! 1. Keyword pass always runs: case-insensitive substring match against
//!    title, overview, and genres.
//! 2. The semantic pass runs only when the keyword pass came up short
//!    (< 8 hits) *and* the query looks worth encoding (multi-word, or one
//!    long descriptive word). Cheap queries never touch the encoder.
//! 3. Keyword results come first; duplicates keep their keyword slot. The
//!    merged set is filtered, sorted by vote count, and cut to the top 8.
//!
//! Failures on the semantic path (encoder down, bad reply) are logged and
//! degrade the request to keyword-only results; they never abort a search.

use catalog::CatalogStore;
use encoder::QueryEmbeddingCache;
use ranker::Filters;
use rayon::prelude::*;
use similarity::SimilarityIndex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Tuning knobs for hybrid search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Result set size after the merge
    pub max_results: usize,
    /// Top-k fetched from the similarity index on the semantic pass
    pub semantic_k: usize,
    /// Keyword hit count at or above which the semantic pass is skipped
    pub keyword_sufficient: usize,
    /// Single-word queries longer than this still trigger semantics
    pub long_word_len: usize,
    /// Master switch for the semantic pass
    pub semantic: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 8,
            semantic_k: 12,
            keyword_sufficient: 8,
            long_word_len: 8,
            semantic: true,
        }
    }
}

/// Result of one hybrid search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Catalog positions of the merged result set, best first
    pub positions: Vec<usize>,
    /// Hit count of the keyword pass (before merge/filter)
    pub keyword_hits: usize,
    /// Hit count of the semantic pass (0 when it didn't run)
    pub semantic_hits: usize,
    /// Wall-clock duration of the whole operation, for observability only
    pub took: Duration,
}

/// Hybrid keyword + semantic search over the catalog.
pub struct HybridSearch {
    catalog: Arc<CatalogStore>,
    index: Arc<SimilarityIndex>,
    /// `None` when no encoder is available; search stays keyword-only
    queries: Option<Arc<QueryEmbeddingCache>>,
    config: SearchConfig,
}

impl HybridSearch {
    pub fn new(
        catalog: Arc<CatalogStore>,
        index: Arc<SimilarityIndex>,
        queries: Option<Arc<QueryEmbeddingCache>>,
    ) -> Self {
        Self {
            catalog,
            index,
            queries,
            config: SearchConfig::default(),
        }
    }

    /// Override the default configuration.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Run a hybrid search for `query` under the caller's filters.
    #[instrument(skip(self, filters))]
    pub async fn search(&self, query: &str, filters: &Filters) -> SearchOutcome {
        let started = Instant::now();

        let keyword = self.keyword_pass(query);
        let keyword_hits = keyword.len();

        let semantic = if self.should_use_semantic(query, keyword_hits) {
            self.semantic_pass(query).await
        } else {
            Vec::new()
        };
        let semantic_hits = semantic.len();

        // Keyword first; the first occurrence of an id wins
        let mut picked = HashSet::new();
        let mut merged: Vec<usize> = keyword
            .into_iter()
            .chain(semantic)
            .filter(|&position| picked.insert(position))
            .collect();

        merged.retain(|&position| filters.matches(self.catalog.movie(position)));

        // Stable sort: keyword priority survives vote-count ties
        merged.sort_by_key(|&position| std::cmp::Reverse(self.catalog.movie(position).vote_count));
        merged.truncate(self.config.max_results);

        let took = started.elapsed();
        debug!(
            keyword_hits,
            semantic_hits,
            results = merged.len(),
            took_ms = took.as_secs_f64() * 1000.0,
            "Hybrid search finished"
        );

        SearchOutcome {
            positions: merged,
            keyword_hits,
            semantic_hits,
            took,
        }
    }

    /// Case-insensitive substring scan over title, overview, and genres.
    fn keyword_pass(&self, query: &str) -> Vec<usize> {
        let needle = query.to_lowercase();
        self.catalog
            .movies()
            .par_iter()
            .enumerate()
            .filter_map(|(position, movie)| {
                let hit = movie.title.to_lowercase().contains(&needle)
                    || movie.overview.to_lowercase().contains(&needle)
                    || movie.genres.to_lowercase().contains(&needle);
                hit.then_some(position)
            })
            .collect()
    }

    /// Cost-control heuristic: encode only queries that earned it.
    fn should_use_semantic(&self, query: &str, keyword_hits: usize) -> bool {
        if !self.config.semantic || self.queries.is_none() {
            return false;
        }
        if keyword_hits >= self.config.keyword_sufficient {
            return false;
        }
        let words: Vec<&str> = query.split_whitespace().collect();
        words.len() > 1 || words.iter().any(|w| w.chars().count() > self.config.long_word_len)
    }

    /// Encode (or fetch cached) and query the similarity index.
    ///
    /// Any failure here degrades to an empty contribution.
    async fn semantic_pass(&self, query: &str) -> Vec<usize> {
        let Some(queries) = &self.queries else {
            return Vec::new();
        };

        let embedding = match queries.get(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Semantic search degraded to keyword-only: {}", e);
                return Vec::new();
            }
        };

        match self.index.search(&embedding, self.config.semantic_k) {
            Ok(hits) => hits.into_iter().map(|hit| hit.position).collect(),
            Err(e) => {
                warn!("Similarity lookup failed, keeping keyword results: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog::{Embeddings, Movie};
    use encoder::{EncoderError, TextEncoder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Encoder that always answers with a fixed vector and counts calls.
    struct FixedEncoder {
        vector: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedEncoder {
        fn new(vector: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                vector,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextEncoder for FixedEncoder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>, EncoderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }
    }

    struct BrokenEncoder;

    #[async_trait]
    impl TextEncoder for BrokenEncoder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>, EncoderError> {
            Err(EncoderError::Unavailable("connection refused".to_string()))
        }
    }

    fn movie(id: u32, title: &str, overview: &str, genres: &str, votes: u32) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            genres: genres.to_string(),
            overview: overview.to_string(),
            release_date: "1999-01-01".to_string(),
            poster_path: String::new(),
            vote_count: votes,
            original_language: "en".to_string(),
            adult: false,
        }
    }

    fn fixture() -> (Arc<CatalogStore>, Arc<SimilarityIndex>) {
        let movies = vec![
            movie(1, "The Matrix", "A hacker discovers reality", "Action,Sci-Fi", 9000),
            movie(2, "Matrix Reloaded", "The hacker returns", "Action,Sci-Fi", 7000),
            movie(3, "Amelie", "A shy waitress in Paris", "Comedy,Romance", 5000),
            movie(4, "Heat", "Cops and robbers", "Action,Crime", 6000),
            movie(5, "Solaris", "A planet that dreams", "Sci-Fi,Drama", 800),
        ];
        let rows = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.5, 0.5],
            vec![0.1, 0.9],
        ];
        let catalog = Arc::new(
            CatalogStore::new(movies, Embeddings::from_rows(rows).unwrap()).unwrap(),
        );
        let index = Arc::new(SimilarityIndex::build(Arc::clone(&catalog)));
        (catalog, index)
    }

    fn search_with(encoder: Arc<dyn TextEncoder>) -> (HybridSearch, Arc<CatalogStore>) {
        let (catalog, index) = fixture();
        let cache = Arc::new(QueryEmbeddingCache::new(encoder, 50));
        (
            HybridSearch::new(Arc::clone(&catalog), index, Some(cache)),
            catalog,
        )
    }

    #[tokio::test]
    async fn test_short_keyword_query_never_touches_encoder() {
        // "matrix" is a single short word: keyword-only by the heuristic
        let enc = FixedEncoder::new(vec![0.0, 1.0]);
        let (search, catalog) = search_with(enc.clone());

        let outcome = search.search("matrix", &Filters::default()).await;

        let ids: Vec<u32> = outcome
            .positions
            .iter()
            .map(|&p| catalog.movie(p).id)
            .collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&2));
        assert_eq!(outcome.semantic_hits, 0);
        assert_eq!(enc.calls(), 0);
    }

    #[tokio::test]
    async fn test_multiword_rare_query_triggers_semantic_pass() {
        let enc = FixedEncoder::new(vec![0.0, 1.0]);
        let (search, catalog) = search_with(enc.clone());

        let outcome = search
            .search("shy parisian dreamer", &Filters::default())
            .await;

        assert_eq!(outcome.keyword_hits, 0);
        assert!(outcome.semantic_hits > 0);
        assert_eq!(enc.calls(), 1);

        // The e2-aligned query should surface Amelie (e2) among the results
        let ids: Vec<u32> = outcome
            .positions
            .iter()
            .map(|&p| catalog.movie(p).id)
            .collect();
        assert!(ids.contains(&3));
    }

    #[tokio::test]
    async fn test_single_long_word_triggers_semantic_pass() {
        let enc = FixedEncoder::new(vec![0.0, 1.0]);
        let (search, _) = search_with(enc.clone());

        let outcome = search.search("melancholia", &Filters::default()).await;
        assert_eq!(enc.calls(), 1);
        assert!(outcome.semantic_hits > 0);
    }

    #[tokio::test]
    async fn test_broken_encoder_degrades_to_keyword_only() {
        let (search, catalog) = search_with(Arc::new(BrokenEncoder));

        let outcome = search
            .search("hacker discovers reality", &Filters::default())
            .await;

        // Keyword pass still matched on overview text
        assert!(outcome
            .positions
            .iter()
            .any(|&p| catalog.movie(p).id == 1));
        assert_eq!(outcome.semantic_hits, 0);
    }

    #[tokio::test]
    async fn test_no_cache_means_keyword_only() {
        let (catalog, index) = fixture();
        let search = HybridSearch::new(Arc::clone(&catalog), index, None);

        let outcome = search.search("a planet that dreams", &Filters::default()).await;
        assert_eq!(outcome.semantic_hits, 0);
        assert!(outcome
            .positions
            .iter()
            .any(|&p| catalog.movie(p).id == 5));
    }

    #[tokio::test]
    async fn test_merge_dedupes_with_keyword_priority() {
        // Semantic pass returns e1-aligned movies, which overlap the
        // keyword hits for "matrix hacker story"; ids must appear once
        let enc = FixedEncoder::new(vec![1.0, 0.0]);
        let (search, catalog) = search_with(enc);

        let outcome = search.search("hacker returns", &Filters::default()).await;

        let ids: Vec<u32> = outcome
            .positions
            .iter()
            .map(|&p| catalog.movie(p).id)
            .collect();
        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());
    }

    #[tokio::test]
    async fn test_results_sorted_by_votes_and_filtered() {
        let enc = FixedEncoder::new(vec![1.0, 0.0]);
        let (search, catalog) = search_with(enc);

        let filters = Filters {
            genre: Some("sci-fi".to_string()),
            ..Default::default()
        };
        let outcome = search.search("a", &filters).await; // matches everything

        let votes: Vec<u32> = outcome
            .positions
            .iter()
            .map(|&p| catalog.movie(p).vote_count)
            .collect();
        let mut sorted = votes.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(votes, sorted);

        for &p in &outcome.positions {
            assert!(catalog
                .movie(p)
                .genres
                .to_lowercase()
                .contains("sci-fi"));
        }
    }

    #[tokio::test]
    async fn test_truncates_to_max_results() {
        let movies: Vec<Movie> = (1..=12)
            .map(|id| movie(id, &format!("Saga part {}", id), "", "Action", id * 10))
            .collect();
        let rows: Vec<Vec<f32>> = (0..12).map(|_| vec![1.0, 0.0]).collect();
        let catalog = Arc::new(
            CatalogStore::new(movies, Embeddings::from_rows(rows).unwrap()).unwrap(),
        );
        let index = Arc::new(SimilarityIndex::build(Arc::clone(&catalog)));
        let search = HybridSearch::new(Arc::clone(&catalog), index, None);

        let outcome = search.search("saga", &Filters::default()).await;
        assert_eq!(outcome.keyword_hits, 12);
        assert_eq!(outcome.positions.len(), 8);
        // Top votes first: part 12 down to part 5
        assert_eq!(catalog.movie(outcome.positions[0]).id, 12);
    }

    #[tokio::test]
    async fn test_repeated_search_is_idempotent_and_cached() {
        let enc = FixedEncoder::new(vec![0.0, 1.0]);
        let (search, _) = search_with(enc.clone());

        let first = search.search("shy parisian dreamer", &Filters::default()).await;
        let second = search.search("shy parisian dreamer", &Filters::default()).await;

        assert_eq!(first.positions, second.positions);
        assert_eq!(enc.calls(), 1); // second run hit the query cache
    }
}
