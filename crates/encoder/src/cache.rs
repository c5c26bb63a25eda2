//! Bounded LRU cache of query embeddings.
//!
//! Keyed on the *literal* query string, with no trimming or case folding, so
//! "Matrix" and "matrix" are distinct entries. That keeps the hot path to a
//! single hash lookup and is an accepted tradeoff, not a bug.
//!
//! The whole get-or-insert-with-eviction operation runs under one async
//! mutex, held across the encode call on a miss. That makes eviction atomic
//! and collapses concurrent misses for the same query into one encoder call,
//! at the cost of serializing cold misses; hits only hold the lock for the
//! lookup itself.

use crate::{EncoderError, TextEncoder};
use catalog::vector;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Fixed capacity used by the engine; not caller-tunable per request.
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 50;

struct LruState {
    entries: HashMap<String, Vec<f32>>,
    /// Keys from least- to most-recently used
    order: VecDeque<String>,
}

impl LruState {
    /// Move `key` to the most-recently-used end.
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    /// Insert a fresh entry, evicting the least-recently-used one at capacity.
    fn insert(&mut self, key: String, value: Vec<f32>, capacity: usize) {
        while self.entries.len() >= capacity {
            match self.order.pop_front() {
                Some(evicted) => {
                    debug!(query = %evicted, "Evicting least-recently-used query embedding");
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }
}

/// Caches normalized query embeddings in front of a `TextEncoder`.
pub struct QueryEmbeddingCache {
    encoder: Arc<dyn TextEncoder>,
    capacity: usize,
    inner: Mutex<LruState>,
}

impl QueryEmbeddingCache {
    pub fn new(encoder: Arc<dyn TextEncoder>, capacity: usize) -> Self {
        Self {
            encoder,
            capacity: capacity.max(1),
            inner: Mutex::new(LruState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Get the unit-norm embedding for `query`, encoding on a cache miss.
    ///
    /// A hit marks the entry most-recently used. A miss invokes the encoder,
    /// normalizes the reply, and inserts it, evicting the LRU entry when the
    /// cache is full.
    pub async fn get(&self, query: &str) -> Result<Vec<f32>, EncoderError> {
        let mut state = self.inner.lock().await;

        if let Some(cached) = state.entries.get(query) {
            let cached = cached.clone();
            state.touch(query);
            debug!(query, "Query embedding cache hit");
            return Ok(cached);
        }

        debug!(query, "Query embedding cache miss");
        let mut embedding = self.encoder.encode(query).await?;
        if !vector::normalize(&mut embedding) {
            return Err(EncoderError::InvalidEmbedding(
                "service returned a zero-norm vector".to_string(),
            ));
        }

        state.insert(query.to_string(), embedding.clone(), self.capacity);
        Ok(embedding)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether `query` is currently cached (does not touch recency).
    pub async fn contains(&self, query: &str) -> bool {
        self.inner.lock().await.entries.contains_key(query)
    }
}
