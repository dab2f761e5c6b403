//! Output traits and error types
//!
//! This module defines the sink interface the coordinator feeds crawled pages
//! into and the errors raised while writing results.

use crate::crawler::CrawledPage;
use crate::SitewalkError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives every successfully crawled page
///
/// Sink failures are logged by the coordinator and never stop a crawl.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    async fn accept(&self, page: &CrawledPage) -> Result<(), SitewalkError>;
}
