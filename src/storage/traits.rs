//! Storage traits and error types
//!
//! This module defines the trait interface for page stores and the errors
//! they report.

use crate::storage::{PageRecord, PageStatistics, PageSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page store implementations
///
/// A page store keeps the full text of every crawled page, keyed by URL.
pub trait Storage {
    /// Inserts a page, replacing any previous row for the same URL
    ///
    /// # Arguments
    ///
    /// * `url` - The crawled URL
    /// * `title` - Page title (may be empty)
    /// * `content` - Full normalized text
    /// * `links_count` - Number of in-scope links found on the page
    /// * `metadata` - Optional extra data, stored as JSON
    fn save_page(
        &mut self,
        url: &str,
        title: &str,
        content: &str,
        links_count: usize,
        metadata: Option<&serde_json::Value>,
    ) -> StorageResult<()>;

    /// Checks whether a URL has been stored
    fn page_exists(&self, url: &str) -> StorageResult<bool>;

    /// Loads a stored page by URL
    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Lists stored pages, most recently crawled first
    fn list_pages(&self, limit: Option<usize>) -> StorageResult<Vec<PageSummary>>;

    /// Finds pages whose title or content contains `term`
    fn search_pages(&self, term: &str) -> StorageResult<Vec<PageSummary>>;

    /// Aggregate counts over the whole store
    fn get_statistics(&self) -> StorageResult<PageStatistics>;
}
