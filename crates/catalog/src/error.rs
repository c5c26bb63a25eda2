//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur while building or loading the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// I/O error while reading a catalog file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of the movie file couldn't be decoded
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// The movie list and the embedding matrix disagree on row count
    #[error("Catalog has {movies} movies but {embeddings} embedding rows")]
    CountMismatch { movies: usize, embeddings: usize },

    /// An embedding row has the wrong number of components
    #[error("Embedding row {row} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An embedding row has zero L2 norm and cannot be normalized
    #[error("Embedding row {row} has zero norm and cannot be normalized")]
    ZeroNormRow { row: usize },

    /// Two movie records share the same id
    #[error("Duplicate movie id {id} at catalog positions {first} and {second}")]
    DuplicateId { id: u32, first: usize, second: usize },

    /// The embedding file is truncated or its header is inconsistent
    #[error("Invalid embedding file {path}: {reason}")]
    InvalidEmbeddingFile { path: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
