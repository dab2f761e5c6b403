//! Semantic search over crawled pages
//!
//! Pages are embedded into fixed-width vectors and kept in a small SQLite table,
//! one row per page per collection. Search ranks stored pages by cosine distance
//! to the embedded query.
//!
//! Two embedders are available:
//! - [`HashingEmbedder`]: local feature hashing, deterministic, no network
//! - [`OpenAiEmbedder`]: any OpenAI-compatible `/embeddings` endpoint

mod embedder;
mod store;

pub use embedder::{embedder_from_config, Embedder, HashingEmbedder, OpenAiEmbedder};
pub use store::{document_id, VectorIndex, MAX_DOCUMENT_CHARS};

use thiserror::Error;

/// Errors raised by the vector index and its embedders
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding request failed: {0}")]
    Embedding(String),

    #[error("Embedder misconfigured: {0}")]
    Config(String),

    #[error("Embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector index task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Vector index lock poisoned")]
    LockPoisoned,
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// One ranked search result
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub metadata: serde_json::Value,
    /// Cosine distance to the query, `0.0` is identical
    pub distance: f32,
}
