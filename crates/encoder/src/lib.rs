//! Text-encoder client for the out-of-process sentence-encoder service.
//!
//! This crate provides:
//! - The `TextEncoder` trait, the seam between the search core and whatever
//!   actually produces query embeddings
//! - `GrpcEncoder`, a tonic client for the remote encoder service
//! - `QueryEmbeddingCache`, a bounded LRU cache over any `TextEncoder` so
//!   repeated query strings don't hit the service twice
//!
//! Encoder failures are never fatal to a request: callers on the semantic
//! search path catch `EncoderError` and degrade to keyword-only results.

use async_trait::async_trait;
use thiserror::Error;
use tonic::transport::Channel;
use tracing::{error, info};

pub mod cache;

pub use cache::{QueryEmbeddingCache, DEFAULT_QUERY_CACHE_CAPACITY};

// Include the generated protobuf code
pub mod pb {
    tonic::include_proto!("encoder");
}

use pb::{text_encoder_client::TextEncoderClient as GrpcTextEncoderClient, EncodeRequest};

/// Errors that can occur when producing a query embedding
#[derive(Error, Debug)]
pub enum EncoderError {
    /// The encoder service could not be reached or initialized
    #[error("Text encoder unavailable: {0}")]
    Unavailable(String),

    /// An encode call failed after a connection was established
    #[error("Encode request failed: {0}")]
    Encode(String),

    /// The service replied with an unusable vector (empty or zero-norm)
    #[error("Encoder returned an invalid embedding: {0}")]
    InvalidEmbedding(String),
}

/// Anything that can turn a query string into an embedding vector.
///
/// Implementations do not have to normalize their output; the query cache
/// normalizes before handing vectors to the similarity index.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError>;
}

/// Client for the remote sentence-encoder service.
///
/// Wraps the generated gRPC client. The underlying channel is cheap to
/// clone, so each call clones it instead of locking a shared client.
pub struct GrpcEncoder {
    client: GrpcTextEncoderClient<Channel>,
}

impl GrpcEncoder {
    /// Connect to the encoder service.
    ///
    /// This is the one-time cold-start cost on the semantic path; callers
    /// should expect the first call to be slow and later calls to reuse the
    /// established channel.
    pub async fn connect(addr: impl Into<String>) -> Result<Self, EncoderError> {
        let addr = addr.into();
        info!("Connecting to text encoder at {}", addr);

        let channel = Channel::from_shared(addr.clone())
            .map_err(|e| EncoderError::Unavailable(format!("invalid address {}: {}", addr, e)))?
            .connect()
            .await
            .map_err(|e| EncoderError::Unavailable(e.to_string()))?;

        Ok(Self {
            client: GrpcTextEncoderClient::new(channel),
        })
    }
}

#[async_trait]
impl TextEncoder for GrpcEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(EncodeRequest {
            text: text.to_string(),
        });

        let reply = client.encode(request).await.map_err(|e| {
            error!("gRPC error while encoding query: {}", e);
            EncoderError::Encode(e.to_string())
        })?;

        let embedding = reply.into_inner().embedding;
        if embedding.is_empty() {
            return Err(EncoderError::InvalidEmbedding(
                "service returned an empty vector".to_string(),
            ));
        }
        Ok(embedding)
    }
}
