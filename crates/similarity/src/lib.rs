//! # Similarity Crate
//!
//! Exact nearest-neighbor search over the catalog's unit-norm embedding
//! matrix using the inner product, which equals cosine similarity under the
//! catalog's normalization invariant.
//!
//! The index is a linear scan: with a few tens of thousands of 384-dim rows
//! a full parallel pass is cheap, deterministic, and exact, so nothing
//! approximate is needed here. Two query shapes are exposed:
//!
//! - `search`: top-k hits, for hybrid search
//! - `score_all`: a dense score per catalog row, for the recommendation
//!   ranker, which penalizes and re-sorts the whole catalog itself
//!
//! The index is read-only after construction and safe to share across
//! threads; the engine builds it lazily on first use.

use catalog::{vector, CatalogStore};
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors from similarity queries
#[derive(Error, Debug)]
pub enum IndexError {
    /// Query vector dimension doesn't match the catalog's embedding dimension
    #[error("Query vector has dimension {found}, index expects {expected}")]
    InvalidDimension { expected: usize, found: usize },
}

/// A single search hit: a catalog position and its similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Catalog position (not movie id)
    pub position: usize,
    /// Inner-product similarity in `[-1, 1]`
    pub score: f32,
}

/// Exact inner-product index over the catalog embedding matrix.
pub struct SimilarityIndex {
    catalog: Arc<CatalogStore>,
}

impl SimilarityIndex {
    /// Build an index over a loaded catalog.
    pub fn build(catalog: Arc<CatalogStore>) -> Self {
        debug!(
            rows = catalog.len(),
            dim = catalog.dim(),
            "Building similarity index"
        );
        Self { catalog }
    }

    /// Embedding dimension the index expects for queries.
    pub fn dim(&self) -> usize {
        self.catalog.dim()
    }

    fn check_dim(&self, query: &[f32]) -> Result<(), IndexError> {
        if query.len() != self.catalog.dim() {
            return Err(IndexError::InvalidDimension {
                expected: self.catalog.dim(),
                found: query.len(),
            });
        }
        Ok(())
    }

    /// Inner product of `query` against every catalog row, in catalog order.
    pub fn score_all(&self, query: &[f32]) -> Result<Vec<f32>, IndexError> {
        self.check_dim(query)?;
        Ok(self
            .catalog
            .embeddings()
            .par_rows()
            .map(|row| vector::dot(query, row))
            .collect())
    }

    /// The `k` highest-scoring catalog positions, descending by score.
    ///
    /// Ties break toward the lower catalog position, so results are
    /// deterministic for a given catalog.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let scores = self.score_all(query)?;

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_unstable_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        order.truncate(k);

        Ok(order
            .into_iter()
            .map(|position| SearchHit {
                position,
                score: scores[position],
            })
            .collect())
    }
}
