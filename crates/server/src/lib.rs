//! Engine facade for the swipe recommendation service.
//!
//! This crate ties the pipeline together behind `RecommendEngine` and
//! defines the wire-facing request/response types. It deliberately contains
//! no transport: HTTP routing, CORS, and deployment concerns live outside
//! this workspace.

pub mod api;
pub mod engine;

pub use api::{
    FeedbackRequest, FeedbackResponse, FilterParams, HealthResponse, MovieView,
    RecommendRequest, RecommendResponse, SearchRequest, SearchResponse, POSTER_BASE_URL,
};
pub use engine::{EngineConfig, RecommendEngine};
