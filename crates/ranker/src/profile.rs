//! Taste Profile Builder: liked ids in, one unit-norm preference vector out.

use crate::error::RankError;
use catalog::{vector, CatalogStore, MovieId};
use std::sync::Arc;
use tracing::debug;

/// Builds a taste vector from the user's liked movie ids.
///
/// The taste vector is the arithmetic mean of the liked movies' embeddings,
/// re-normalized to unit length. It is recomputed on every request and never
/// stored server-side; the client owns its own history.
pub struct TasteProfileBuilder {
    catalog: Arc<CatalogStore>,
}

impl TasteProfileBuilder {
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Build the taste vector for a list of liked ids.
    ///
    /// Ids with no catalog match are silently skipped; a stale client-side
    /// id is not an error. Returns `Ok(None)` when nothing resolves, and
    /// `Err(DegenerateTasteVector)` in the pathological case where the
    /// resolved embeddings sum to the zero vector.
    pub fn build(&self, liked_ids: &[MovieId]) -> Result<Option<Vec<f32>>, RankError> {
        let rows: Vec<&[f32]> = liked_ids
            .iter()
            .filter_map(|&id| self.catalog.embedding_of(id))
            .collect();

        if rows.is_empty() {
            debug!(
                liked = liked_ids.len(),
                "No liked ids resolved to a catalog entry"
            );
            return Ok(None);
        }

        let mut mean = vec![0.0f32; self.catalog.dim()];
        for row in &rows {
            for (m, x) in mean.iter_mut().zip(row.iter()) {
                *m += x;
            }
        }
        let n = rows.len() as f32;
        for m in mean.iter_mut() {
            *m /= n;
        }

        if !vector::normalize(&mut mean) {
            return Err(RankError::DegenerateTasteVector);
        }
        Ok(Some(mean))
    }
}
