//! Wire-facing request and response types.
//!
//! These are transport-agnostic: any HTTP or RPC layer can serialize them
//! as-is. The shapes match what swipe clients already consume, including the
//! `{"error": ...}` body for structured no-result outcomes and the null
//! `taste_vector` acknowledgement on feedback.

use catalog::{Movie, MovieId};
use ranker::Filters;
use serde::{Deserialize, Serialize};

/// CDN prefix prepended to stored poster paths.
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w185";

/// Filter parameters shared by the recommend and search operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_start: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_end: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adult: Option<bool>,
}

impl From<FilterParams> for Filters {
    fn from(params: FilterParams) -> Self {
        Filters {
            genre: params.genre,
            language: params.language,
            year_start: params.year_start,
            year_end: params.year_end,
            adult: params.adult,
        }
    }
}

/// The caller's swipe history plus filters. The client owns all state; the
/// engine keeps nothing between requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub seen_ids: Vec<MovieId>,
    #[serde(default)]
    pub liked_ids: Vec<MovieId>,
    #[serde(flatten)]
    pub filters: FilterParams,
}

/// A free-text query plus filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(flatten)]
    pub filters: FilterParams,
}

/// A single swipe event. Accepted for forward compatibility; the engine is
/// stateless, so this is acknowledged and dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub movie_id: MovieId,
    /// Free-form verdict string from the client, e.g. "like" or "dislike"
    pub feedback: String,
}

/// Client-facing projection of a catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieView {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: String,
    pub overview: String,
    pub release_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

impl From<&Movie> for MovieView {
    fn from(movie: &Movie) -> Self {
        let poster_url = if movie.poster_path.is_empty() {
            None
        } else {
            Some(format!("{}{}", POSTER_BASE_URL, movie.poster_path))
        };
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            genres: movie.genres.clone(),
            overview: movie.overview.clone(),
            release_date: movie.release_date.clone(),
            poster_url,
        }
    }
}

/// Outcome of a recommend call: either the next card or a structured
/// explanation of why there is none. Serialized untagged, so clients see
/// either `{"movie": ..., "taste_vector": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendResponse {
    Match {
        movie: MovieView,
        taste_vector: Option<Vec<f32>>,
    },
    NoMatch {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub movies: Vec<MovieView>,
    pub took_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    /// Always null: taste vectors are derived per request, never stored
    pub taste_vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub movies_loaded: usize,
    /// `[rows, dim]` of the embedding matrix
    pub embeddings_shape: [usize; 2],
}
