//! Recommendation Ranker: picks the next card for the swipe deck.
//!
//! Three tiers, evaluated in order, first match wins:
//!
//! 1. **Onboarding** (`liked < 5`): random sample from the most popular
//!    entries, so new users rate well-known movies first. A dry sample falls
//!    through instead of failing, which lets users with restrictive filters
//!    escape onboarding.
//! 2. **Similarity** (`liked ≥ 1`): taste vector against the whole catalog,
//!    soft dislike penalty, filtered walk with a per-pass primary-genre cap.
//! 3. **Popularity fallback** (no liked ids): first unseen filter-passing
//!    entry among the top entries by vote count.

use crate::error::RankError;
use crate::profile::TasteProfileBuilder;
use crate::state::RequestState;
use catalog::CatalogStore;
use rand::Rng;
use similarity::SimilarityIndex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tuning knobs for the ranker. One parameterized core instead of forked
/// per-deployment variants.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Below this many liked ids the onboarding tier runs first
    pub onboarding_liked_threshold: usize,
    /// Popularity pool the onboarding sample is drawn from
    pub onboarding_pool: usize,
    /// Onboarding sample size, drawn without replacement
    pub onboarding_sample: usize,
    /// Popularity pool scanned by the fallback tier
    pub fallback_pool: usize,
    /// Weight of the per-disliked-movie similarity penalty
    pub dislike_penalty: f32,
    /// Max entries sharing a primary genre emitted per ranking pass
    pub genre_cap: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            onboarding_liked_threshold: 5,
            onboarding_pool: 100,
            onboarding_sample: 30,
            fallback_pool: 200,
            dislike_penalty: 0.1,
            genre_cap: 5,
        }
    }
}

/// A single ranked pick.
#[derive(Debug, Clone)]
pub struct Recommendation {
    /// Catalog position of the picked movie
    pub position: usize,
    /// Taste vector used for the pick, for the client to persist; `None`
    /// when the pick came from the onboarding or popularity tiers
    pub taste_vector: Option<Vec<f32>>,
}

/// A multi-pick ranking pass from the similarity tier.
#[derive(Debug, Clone)]
pub struct RankedBatch {
    /// Catalog positions, best first
    pub positions: Vec<usize>,
    pub taste_vector: Vec<f32>,
}

/// The three-tier recommendation ranker.
pub struct RecommendationRanker {
    catalog: Arc<CatalogStore>,
    index: Arc<SimilarityIndex>,
    profile: TasteProfileBuilder,
    config: RankerConfig,
}

impl RecommendationRanker {
    pub fn new(catalog: Arc<CatalogStore>, index: Arc<SimilarityIndex>) -> Self {
        let profile = TasteProfileBuilder::new(Arc::clone(&catalog));
        Self {
            catalog,
            index,
            profile,
            config: RankerConfig::default(),
        }
    }

    /// Override the default configuration.
    pub fn with_config(mut self, config: RankerConfig) -> Self {
        self.config = config;
        self
    }

    /// Pick the next card using a thread-local RNG for the onboarding sample.
    pub fn recommend(&self, state: &RequestState) -> Result<Recommendation, RankError> {
        self.recommend_with_rng(state, &mut rand::rng())
    }

    /// Pick the next card with an injected RNG (deterministic in tests).
    #[instrument(skip_all, fields(seen = state.seen_ids.len(), liked = state.liked_ids.len()))]
    pub fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        state: &RequestState,
        rng: &mut R,
    ) -> Result<Recommendation, RankError> {
        // Tier 1: onboarding
        if state.liked_ids.len() < self.config.onboarding_liked_threshold {
            if let Some(position) = self.onboarding_pick(state, rng) {
                debug!(position, "Onboarding tier pick");
                return Ok(Recommendation {
                    position,
                    taste_vector: None,
                });
            }
            debug!("No onboarding candidate passed the filters, falling through");
        }

        // Tier 2: similarity
        if !state.liked_ids.is_empty() {
            match self.profile.build(&state.liked_ids) {
                Ok(Some(taste)) => {
                    let picks = self.similarity_walk(state, &taste, 1)?;
                    return match picks.into_iter().next() {
                        Some(position) => {
                            debug!(position, "Similarity tier pick");
                            Ok(Recommendation {
                                position,
                                taste_vector: Some(taste),
                            })
                        }
                        None => Err(RankError::NoUnseenMatches),
                    };
                }
                // Insufficient signal either way; fall to popularity
                Ok(None) | Err(RankError::DegenerateTasteVector) => {
                    debug!("Liked ids carry no usable taste signal, using popularity fallback");
                }
                Err(e) => return Err(e),
            }
        }

        // Tier 3: popularity fallback
        self.popularity_pick(state)
    }

    /// Similarity-tier ranking pass returning up to `limit` picks.
    ///
    /// The primary-genre cap applies across the whole pass, so a batch never
    /// contains more than `genre_cap` entries of one primary genre.
    pub fn rank_batch(&self, state: &RequestState, limit: usize) -> Result<RankedBatch, RankError> {
        let taste = self
            .profile
            .build(&state.liked_ids)?
            .ok_or(RankError::DegenerateTasteVector)?;

        let positions = self.similarity_walk(state, &taste, limit)?;
        if positions.is_empty() {
            return Err(RankError::NoUnseenMatches);
        }
        Ok(RankedBatch {
            positions,
            taste_vector: taste,
        })
    }

    /// Draw a random subset of the popular pool and return the first entry
    /// that is unseen and passes the filters.
    fn onboarding_pick<R: Rng + ?Sized>(
        &self,
        state: &RequestState,
        rng: &mut R,
    ) -> Option<usize> {
        let pool = self.catalog.top_by_votes(self.config.onboarding_pool);
        if pool.is_empty() {
            return None;
        }

        let amount = self.config.onboarding_sample.min(pool.len());
        let excluded = state.excluded();

        for idx in rand::seq::index::sample(rng, pool.len(), amount) {
            let position = pool[idx];
            let movie = self.catalog.movie(position);
            if excluded.contains(&movie.id) {
                continue;
            }
            if !state.filters.matches(movie) {
                continue;
            }
            return Some(position);
        }
        None
    }

    /// Score the catalog against the taste vector, apply dislike penalties,
    /// and walk the result best-first.
    fn similarity_walk(
        &self,
        state: &RequestState,
        taste: &[f32],
        limit: usize,
    ) -> Result<Vec<usize>, RankError> {
        let mut scores = self.index.score_all(taste)?;

        // Soft penalty: each disliked movie pulls down everything similar to
        // it, rather than excluding anything outright
        for id in state.disliked() {
            if let Some(position) = self.catalog.position(id) {
                let sims = self.index.score_all(self.catalog.embedding(position))?;
                for (score, sim) in scores.iter_mut().zip(sims.iter()) {
                    *score -= self.config.dislike_penalty * sim;
                }
            }
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_unstable_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let excluded = state.excluded();
        let mut emitted_by_genre: HashMap<String, usize> = HashMap::new();
        let mut picks = Vec::new();

        for position in order {
            let movie = self.catalog.movie(position);
            if excluded.contains(&movie.id) {
                continue;
            }
            if !state.filters.matches(movie) {
                continue;
            }
            if let Some(genre) = movie.primary_genre() {
                let count = emitted_by_genre.entry(genre).or_insert(0);
                if *count >= self.config.genre_cap {
                    continue;
                }
                *count += 1;
            }

            picks.push(position);
            if picks.len() >= limit {
                break;
            }
        }

        Ok(picks)
    }

    /// Scan the popularity pool in vote order for the first viable entry.
    fn popularity_pick(&self, state: &RequestState) -> Result<Recommendation, RankError> {
        let excluded = state.excluded();

        for &position in self.catalog.top_by_votes(self.config.fallback_pool) {
            let movie = self.catalog.movie(position);
            if excluded.contains(&movie.id) {
                continue;
            }
            if !state.filters.matches(movie) {
                continue;
            }
            debug!(position, "Popularity tier pick");
            return Ok(Recommendation {
                position,
                taste_vector: None,
            });
        }
        Err(RankError::NoPopularMatches)
    }
}
