//! Error types for the ranker crate.

use similarity::IndexError;
use thiserror::Error;

/// Errors that can occur while ranking candidates
#[derive(Error, Debug)]
pub enum RankError {
    /// Liked ids resolved to a zero-sum mean (or the batch API was given no
    /// resolvable liked ids); callers treat this as "insufficient signal"
    #[error("Taste vector is degenerate: liked embeddings sum to zero")]
    DegenerateTasteVector,

    /// The similarity walk visited every catalog entry without a survivor
    #[error("No more unseen movies matching the filters.")]
    NoUnseenMatches,

    /// The popularity fallback found nothing either
    #[error("No movies found matching the specified filters.")]
    NoPopularMatches,

    /// Dimension mismatch from the similarity index (programmer error)
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl RankError {
    /// Whether this is a structured "no results" outcome rather than a fault.
    pub fn is_no_candidate(&self) -> bool {
        matches!(self, Self::NoUnseenMatches | Self::NoPopularMatches)
    }
}
