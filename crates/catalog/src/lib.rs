//! # Catalog Crate
//!
//! In-memory movie catalog: strongly-typed records plus a parallel matrix of
//! unit-norm embedding vectors, indexed for the lookups the ranking and
//! search stages need.
//!
//! ## Main Components
//!
//! - **types**: `Movie`, `Embeddings`, and the read-only `CatalogStore`
//! - **loader**: JSONL + binary embedding file loaders
//! - **vector**: dot product / normalization helpers
//! - **error**: `CatalogError`
//!
//! ## Invariants
//!
//! - Movie ids are unique and stable for the process lifetime
//! - Embedding row `i` belongs to the movie at catalog position `i`
//! - Every stored embedding row has unit L2 norm (re-normalized at load)
//! - The store is never mutated after construction; share it as
//!   `Arc<CatalogStore>`

pub mod error;
pub mod loader;
pub mod types;
pub mod vector;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{CatalogStore, Embeddings, Movie, MovieId};
