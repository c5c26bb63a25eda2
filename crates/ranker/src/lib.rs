//! # Ranker Crate
//!
//! The recommendation core for the swipe deck:
//!
//! - **state**: per-request caller state (seen/liked ids + filters); the
//!   system keeps no server-side user state
//! - **filters**: the shared filter predicate (genre / language / year /
//!   adult), also used by hybrid search
//! - **profile**: `TasteProfileBuilder`, liked ids → unit-norm taste vector
//! - **recommend**: the three-tier `RecommendationRanker`
//! - **error**: `RankError`, distinguishing structured "no results" outcomes
//!   from faults

pub mod error;
pub mod filters;
pub mod profile;
pub mod recommend;
pub mod state;

// Re-export commonly used types
pub use error::RankError;
pub use filters::{release_year, Filters};
pub use profile::TasteProfileBuilder;
pub use recommend::{RankedBatch, RankerConfig, Recommendation, RecommendationRanker};
pub use state::RequestState;
