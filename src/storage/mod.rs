//! Storage module for persisting crawled pages
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Page persistence keyed by URL
//! - Keyword search and aggregate statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::SitewalkError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SitewalkError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SitewalkError> {
    SqliteStorage::new(path)
}

/// A stored page
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub text_length: u64,
    pub links_count: u64,
    pub crawled_at: String,
    pub metadata: Option<serde_json::Value>,
}

/// A stored page without its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub text_length: u64,
    pub crawled_at: String,
}

/// Aggregate statistics over all stored pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStatistics {
    pub total_pages: u64,
    pub total_characters: u64,
    pub first_crawl_time: Option<String>,
    pub last_crawl_time: Option<String>,
}
