//! # Recommendation Engine
//!
//! The transport-agnostic facade over the whole pipeline. A serving layer
//! (HTTP, gRPC, the bundled CLI) constructs one `RecommendEngine` per
//! process and calls its four operations:
//!
//! 1. `recommend`: next card for the swipe deck
//! 2. `search`: hybrid keyword + semantic catalog search
//! 3. `feedback`: stateless acknowledgement of a swipe event
//! 4. `health`: catalog readiness report
//!
//! The catalog is loaded eagerly; the similarity index and the encoder
//! connection are lazy singletons so a process that only serves keyword
//! traffic never pays for them. A failed encoder connection is retried on
//! the next semantic request and never fails the engine.

use std::sync::Arc;

use catalog::CatalogStore;
use encoder::{
    GrpcEncoder, QueryEmbeddingCache, TextEncoder, DEFAULT_QUERY_CACHE_CAPACITY,
};
use ranker::{RankerConfig, RecommendationRanker, RequestState};
use search::{HybridSearch, SearchConfig};
use similarity::SimilarityIndex;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::api::{
    FeedbackRequest, FeedbackResponse, HealthResponse, MovieView, RecommendRequest,
    RecommendResponse, SearchRequest, SearchResponse,
};

/// Engine-level configuration. One parameterized engine instead of separate
/// builds per deployment size.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address of the sentence-encoder gRPC service
    pub encoder_addr: String,
    /// Capacity of the query-embedding LRU cache
    pub query_cache_capacity: usize,
    pub ranker: RankerConfig,
    pub search: SearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            encoder_addr: "http://127.0.0.1:50051".to_string(),
            query_cache_capacity: DEFAULT_QUERY_CACHE_CAPACITY,
            ranker: RankerConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// The stateless recommendation and search engine.
///
/// All request state arrives with each call; the engine holds only the
/// immutable catalog and its derived singletons.
pub struct RecommendEngine {
    catalog: Arc<CatalogStore>,
    config: EngineConfig,
    index: OnceCell<Arc<SimilarityIndex>>,
    queries: OnceCell<Arc<QueryEmbeddingCache>>,
}

impl RecommendEngine {
    pub fn new(catalog: Arc<CatalogStore>, config: EngineConfig) -> Self {
        info!(
            movies = catalog.len(),
            dim = catalog.dim(),
            "Recommendation engine ready"
        );
        Self {
            catalog,
            config,
            index: OnceCell::new(),
            queries: OnceCell::new(),
        }
    }

    /// Build an engine with an injected encoder instead of the gRPC client.
    pub fn with_encoder(
        catalog: Arc<CatalogStore>,
        config: EngineConfig,
        text_encoder: Arc<dyn TextEncoder>,
    ) -> Self {
        let cache = Arc::new(QueryEmbeddingCache::new(
            text_encoder,
            config.query_cache_capacity,
        ));
        Self {
            catalog,
            config,
            index: OnceCell::new(),
            queries: OnceCell::new_with(Some(cache)),
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Pick the next card for the caller's swipe state.
    #[instrument(skip_all, fields(seen = request.seen_ids.len(), liked = request.liked_ids.len()))]
    pub async fn recommend(&self, request: RecommendRequest) -> RecommendResponse {
        let state = RequestState::new(
            request.seen_ids,
            request.liked_ids,
            request.filters.into(),
        );

        let index = self.similarity_index().await;
        let ranker = RecommendationRanker::new(Arc::clone(&self.catalog), index)
            .with_config(self.config.ranker.clone());

        match ranker.recommend(&state) {
            Ok(pick) => {
                let movie = self.catalog.movie(pick.position);
                debug!(movie_id = movie.id, "Recommending");
                RecommendResponse::Match {
                    movie: MovieView::from(movie),
                    taste_vector: pick.taste_vector,
                }
            }
            Err(e) => {
                debug!("No recommendation: {}", e);
                RecommendResponse::NoMatch {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Hybrid search over the catalog.
    #[instrument(skip_all, fields(query = %request.query))]
    pub async fn search(&self, request: SearchRequest) -> SearchResponse {
        let index = self.similarity_index().await;
        let queries = self.query_cache().await;

        let searcher = HybridSearch::new(Arc::clone(&self.catalog), index, queries)
            .with_config(self.config.search.clone());

        let filters = request.filters.into();
        let outcome = searcher.search(&request.query, &filters).await;

        SearchResponse {
            movies: outcome
                .positions
                .iter()
                .map(|&p| MovieView::from(self.catalog.movie(p)))
                .collect(),
            took_ms: outcome.took.as_secs_f64() * 1000.0,
        }
    }

    /// Acknowledge a swipe. The engine keeps no per-user state, so this is
    /// a contract-level no-op that always acks with a null taste vector.
    pub fn feedback(&self, request: FeedbackRequest) -> FeedbackResponse {
        debug!(
            movie_id = request.movie_id,
            feedback = %request.feedback,
            "Feedback received"
        );
        FeedbackResponse { taste_vector: None }
    }

    /// Readiness report for probes and dashboards.
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            movies_loaded: self.catalog.len(),
            embeddings_shape: [self.catalog.len(), self.catalog.dim()],
        }
    }

    /// The similarity index, built on first use.
    async fn similarity_index(&self) -> Arc<SimilarityIndex> {
        Arc::clone(
            self.index
                .get_or_init(|| async {
                    info!("Building similarity index");
                    Arc::new(SimilarityIndex::build(Arc::clone(&self.catalog)))
                })
                .await,
        )
    }

    /// The query-embedding cache, connecting the encoder on first use.
    ///
    /// Returns `None` when the encoder is unreachable; the cell stays empty
    /// so the next semantic request retries the connection.
    async fn query_cache(&self) -> Option<Arc<QueryEmbeddingCache>> {
        let result = self
            .queries
            .get_or_try_init(|| async {
                let encoder = GrpcEncoder::connect(self.config.encoder_addr.clone()).await?;
                Ok::<_, encoder::EncoderError>(Arc::new(QueryEmbeddingCache::new(
                    Arc::new(encoder),
                    self.config.query_cache_capacity,
                )))
            })
            .await;

        match result {
            Ok(cache) => Some(Arc::clone(cache)),
            Err(e) => {
                warn!("Text encoder unavailable, semantic search disabled: {}", e);
                None
            }
        }
    }
}
