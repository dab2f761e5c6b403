//! SQLite-based page sink
//!
//! This module provides a sink that persists every crawled page to the
//! SQLite page store.

use crate::crawler::CrawledPage;
use crate::output::traits::{OutputError, PageSink};
use crate::storage::{SqliteStorage, Storage};
use crate::SitewalkError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Persists crawled pages through a shared [`SqliteStorage`]
pub struct SqlitePageSink {
    storage: Arc<Mutex<SqliteStorage>>,
}

impl SqlitePageSink {
    /// Creates a new SQLite page sink
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to write to
    pub fn new(storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PageSink for SqlitePageSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    /// Writes the page on the blocking pool so SQLite never stalls a runtime thread
    async fn accept(&self, page: &CrawledPage) -> Result<(), SitewalkError> {
        let storage = Arc::clone(&self.storage);
        let metadata = page.metadata();
        let url = page.result.url.clone();
        let title = page.result.title.clone();
        let content = page.content.clone();
        let links_count = page.result.extracted_link_count;

        tokio::task::spawn_blocking(move || -> Result<(), SitewalkError> {
            let mut storage = storage
                .lock()
                .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))?;
            storage.save_page(&url, &title, &content, links_count, Some(&metadata))?;
            Ok(())
        })
        .await
        .map_err(|e| OutputError::Storage(format!("Storage task failed: {}", e)))?
    }
}
