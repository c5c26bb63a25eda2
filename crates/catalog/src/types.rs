//! Core domain types: the movie record, the embedding matrix, and the
//! read-only catalog store the rest of the system shares.

use crate::error::{CatalogError, Result};
use crate::vector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a movie (TMDB id in the reference dataset)
pub type MovieId = u32;

/// A single movie record.
///
/// Fields mirror the upstream metadata dump: `genres` is a comma-joined
/// string ("Action,Sci-Fi"), `release_date` is an ISO-like string that may be
/// empty or malformed, `poster_path` is a CDN path fragment, and `vote_count`
/// doubles as the popularity proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub genres: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub poster_path: String,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub adult: bool,
}

impl Movie {
    /// First comma-separated token of the genre field, trimmed and lowercased.
    ///
    /// Returns `None` for an empty genre string.
    pub fn primary_genre(&self) -> Option<String> {
        let first = self.genres.split(',').next()?.trim();
        if first.is_empty() {
            None
        } else {
            Some(first.to_lowercase())
        }
    }
}

/// Row-major matrix of unit-norm embedding vectors, one row per movie.
///
/// Kept as a flat `Vec<f32>` separate from the movie records; row `i`
/// corresponds to the movie at catalog position `i`.
#[derive(Debug, Clone)]
pub struct Embeddings {
    dim: usize,
    data: Vec<f32>,
}

impl Embeddings {
    /// Build from a flat row-major buffer, re-normalizing every row.
    ///
    /// Fails if the buffer length is not a multiple of `dim`, or if any row
    /// has zero norm (a zero row would silently score 0 against everything
    /// and break the unit-norm invariant).
    pub fn from_flat(dim: usize, mut data: Vec<f32>) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(CatalogError::DimensionMismatch {
                row: 0,
                expected: dim,
                found: data.len(),
            });
        }

        // Normalize rows in parallel; collect the first offending row if any.
        let bad_row = data
            .par_chunks_mut(dim)
            .enumerate()
            .filter_map(|(row, chunk)| {
                if vector::normalize(chunk) {
                    None
                } else {
                    Some(row)
                }
            })
            .min();

        if let Some(row) = bad_row {
            return Err(CatalogError::ZeroNormRow { row });
        }

        Ok(Self { dim, data })
    }

    /// Build from per-movie rows (mostly a test convenience).
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(|r| r.len()).unwrap_or(0);
        for (row, r) in rows.iter().enumerate() {
            if r.len() != dim {
                return Err(CatalogError::DimensionMismatch {
                    row,
                    expected: dim,
                    found: r.len(),
                });
            }
        }
        let data: Vec<f32> = rows.into_iter().flatten().collect();
        Self::from_flat(dim, data)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vector dimension D.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Borrow row `i`. Panics on out-of-range `i`, like slice indexing.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over all rows in catalog order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }

    /// Parallel iterator over all rows in catalog order.
    pub fn par_rows(&self) -> impl IndexedParallelIterator<Item = &[f32]> {
        self.data.par_chunks_exact(self.dim)
    }
}

/// Immutable, in-memory movie catalog: records plus the parallel embedding
/// matrix, with an id index and a precomputed popularity ordering.
///
/// Loaded once at startup and shared by reference (`Arc<CatalogStore>`)
/// across all requests; nothing here is mutated after construction.
#[derive(Debug)]
pub struct CatalogStore {
    movies: Vec<Movie>,
    embeddings: Embeddings,
    by_id: HashMap<MovieId, usize>,
    /// Catalog positions ordered by vote_count desc, position asc on ties
    by_votes: Vec<usize>,
}

impl CatalogStore {
    /// Assemble a catalog from records and their embedding matrix.
    ///
    /// Enforces the structural invariants: one embedding row per movie, and
    /// unique movie ids.
    pub fn new(movies: Vec<Movie>, embeddings: Embeddings) -> Result<Self> {
        if movies.len() != embeddings.len() {
            return Err(CatalogError::CountMismatch {
                movies: movies.len(),
                embeddings: embeddings.len(),
            });
        }

        let mut by_id = HashMap::with_capacity(movies.len());
        for (position, movie) in movies.iter().enumerate() {
            if let Some(first) = by_id.insert(movie.id, position) {
                return Err(CatalogError::DuplicateId {
                    id: movie.id,
                    first,
                    second: position,
                });
            }
        }

        let mut by_votes: Vec<usize> = (0..movies.len()).collect();
        by_votes.sort_by(|&a, &b| {
            movies[b]
                .vote_count
                .cmp(&movies[a].vote_count)
                .then(a.cmp(&b))
        });

        Ok(Self {
            movies,
            embeddings,
            by_id,
            by_votes,
        })
    }

    /// Number of movies in the catalog.
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Embedding dimension D.
    pub fn dim(&self) -> usize {
        self.embeddings.dim()
    }

    /// Movie at a catalog position.
    pub fn movie(&self, position: usize) -> &Movie {
        &self.movies[position]
    }

    /// All movies in catalog order.
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Look up a movie by id.
    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.position(id).map(|p| &self.movies[p])
    }

    /// Catalog position of a movie id, if present.
    pub fn position(&self, id: MovieId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Embedding row at a catalog position.
    pub fn embedding(&self, position: usize) -> &[f32] {
        self.embeddings.row(position)
    }

    /// Embedding row for a movie id, if present.
    pub fn embedding_of(&self, id: MovieId) -> Option<&[f32]> {
        self.position(id).map(|p| self.embeddings.row(p))
    }

    /// The full embedding matrix.
    pub fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }

    /// The `n` most popular catalog positions by vote count, descending.
    ///
    /// Ties break toward the lower catalog position, so the ordering is
    /// deterministic across calls.
    pub fn top_by_votes(&self, n: usize) -> &[usize] {
        &self.by_votes[..n.min(self.by_votes.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, votes: u32) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            genres: "Action,Sci-Fi".to_string(),
            overview: String::new(),
            release_date: "1999-03-31".to_string(),
            poster_path: String::new(),
            vote_count: votes,
            original_language: "en".to_string(),
            adult: false,
        }
    }

    #[test]
    fn test_embeddings_rows_are_normalized() {
        let emb = Embeddings::from_rows(vec![vec![3.0, 4.0], vec![0.0, 2.0]]).unwrap();
        for row in emb.rows() {
            assert!((crate::vector::l2_norm(row) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_embeddings_reject_zero_row() {
        let err = Embeddings::from_rows(vec![vec![1.0, 0.0], vec![0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, CatalogError::ZeroNormRow { row: 1 }));
    }

    #[test]
    fn test_embeddings_reject_ragged_rows() {
        let err = Embeddings::from_rows(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, CatalogError::DimensionMismatch { row: 1, .. }));
    }

    #[test]
    fn test_catalog_rejects_count_mismatch() {
        let emb = Embeddings::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let err = CatalogStore::new(vec![movie(1, 10), movie(2, 20)], emb).unwrap_err();
        assert!(matches!(err, CatalogError::CountMismatch { .. }));
    }

    #[test]
    fn test_catalog_rejects_duplicate_ids() {
        let emb = Embeddings::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let err = CatalogStore::new(vec![movie(7, 10), movie(7, 20)], emb).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { id: 7, .. }));
    }

    #[test]
    fn test_lookup_by_id_and_position() {
        let emb = Embeddings::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let catalog = CatalogStore::new(vec![movie(10, 5), movie(20, 9)], emb).unwrap();

        assert_eq!(catalog.position(20), Some(1));
        assert_eq!(catalog.get(10).unwrap().title, "Movie 10");
        assert_eq!(catalog.embedding_of(20).unwrap(), &[0.0, 1.0]);
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn test_top_by_votes_ordering() {
        let emb = Embeddings::from_rows(vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        let catalog =
            CatalogStore::new(vec![movie(1, 5), movie(2, 50), movie(3, 50)], emb).unwrap();

        // 2 and 3 tie on votes; lower catalog position wins
        assert_eq!(catalog.top_by_votes(3), &[1, 2, 0]);
        assert_eq!(catalog.top_by_votes(1), &[1]);
        assert_eq!(catalog.top_by_votes(10).len(), 3);
    }

    #[test]
    fn test_primary_genre() {
        let mut m = movie(1, 0);
        assert_eq!(m.primary_genre().as_deref(), Some("action"));

        m.genres = " Drama , Romance".to_string();
        assert_eq!(m.primary_genre().as_deref(), Some("drama"));

        m.genres = String::new();
        assert_eq!(m.primary_genre(), None);
    }
}
