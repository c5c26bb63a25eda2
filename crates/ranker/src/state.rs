//! Per-request caller state.
//!
//! The system is stateless across requests: the client resubmits its full
//! swipe history (seen + liked ids) on every call, and everything derived
//! from it, taste vector included, is recomputed and discarded.

use crate::filters::Filters;
use catalog::MovieId;
use std::collections::HashSet;

/// Ephemeral, caller-supplied request state.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    /// Ids the user has already been shown
    pub seen_ids: HashSet<MovieId>,
    /// Subset of seen the user swiped right on
    pub liked_ids: Vec<MovieId>,
    pub filters: Filters,
}

impl RequestState {
    pub fn new(
        seen_ids: impl IntoIterator<Item = MovieId>,
        liked_ids: impl IntoIterator<Item = MovieId>,
        filters: Filters,
    ) -> Self {
        Self {
            seen_ids: seen_ids.into_iter().collect(),
            liked_ids: liked_ids.into_iter().collect(),
            filters,
        }
    }

    /// Ids that must never be served: seen ∪ liked.
    pub fn excluded(&self) -> HashSet<MovieId> {
        let mut excluded = self.seen_ids.clone();
        excluded.extend(self.liked_ids.iter().copied());
        excluded
    }

    /// Seen-but-not-liked ids, the negative signal for the soft penalty.
    ///
    /// Sorted so the penalty accumulation order (and thus the float result)
    /// is deterministic for a given request.
    pub fn disliked(&self) -> Vec<MovieId> {
        let liked: HashSet<MovieId> = self.liked_ids.iter().copied().collect();
        let mut disliked: Vec<MovieId> = self
            .seen_ids
            .iter()
            .copied()
            .filter(|id| !liked.contains(id))
            .collect();
        disliked.sort_unstable();
        disliked
    }
}
