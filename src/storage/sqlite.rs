//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{PageRecord, PageStatistics, PageSummary};
use crate::SitewalkError;
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Parent directories of `path` are created when missing.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SitewalkError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SitewalkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened page database at {}", path.display());
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SitewalkError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<PageSummary> {
    Ok(PageSummary {
        url: row.get(0)?,
        title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        text_length: row.get::<_, i64>(2)? as u64,
        crawled_at: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    fn save_page(
        &mut self,
        url: &str,
        title: &str,
        content: &str,
        links_count: usize,
        metadata: Option<&serde_json::Value>,
    ) -> StorageResult<()> {
        // Fixed-width timestamps keep lexical and chronological order equal
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let metadata = metadata.map(serde_json::to_string).transpose()?;
        let text_length = content.chars().count() as i64;

        self.conn.execute(
            "INSERT OR REPLACE INTO pages
                (url, title, content, text_length, links_count, crawled_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                url,
                title,
                content,
                text_length,
                links_count as i64,
                now,
                metadata
            ],
        )?;
        Ok(())
    }

    fn page_exists(&self, url: &str) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM pages WHERE url = ?1", params![url], |_| {
                Ok(())
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, url, title, content, text_length, links_count, crawled_at, metadata
                 FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        PageRecord {
                            id: row.get(0)?,
                            url: row.get(1)?,
                            title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                            content: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                            text_length: row.get::<_, i64>(4)? as u64,
                            links_count: row.get::<_, i64>(5)? as u64,
                            crawled_at: row.get(6)?,
                            metadata: None,
                        },
                        row.get::<_, Option<String>>(7)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((mut page, metadata)) => {
                page.metadata = metadata
                    .map(|raw| serde_json::from_str(&raw))
                    .transpose()?;
                Ok(Some(page))
            }
            None => Ok(None),
        }
    }

    fn list_pages(&self, limit: Option<usize>) -> StorageResult<Vec<PageSummary>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT url, title, text_length, crawled_at FROM pages
             ORDER BY crawled_at DESC, id DESC LIMIT ?1",
        )?;
        let pages = stmt
            .query_map(params![limit], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn search_pages(&self, term: &str) -> StorageResult<Vec<PageSummary>> {
        let pattern = format!("%{}%", term);
        let mut stmt = self.conn.prepare(
            "SELECT url, title, text_length, crawled_at FROM pages
             WHERE title LIKE ?1 OR content LIKE ?1
             ORDER BY crawled_at DESC, id DESC",
        )?;
        let pages = stmt
            .query_map(params![pattern], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn get_statistics(&self) -> StorageResult<PageStatistics> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(text_length), 0), MIN(crawled_at), MAX(crawled_at)
             FROM pages",
            [],
            |row| {
                Ok(PageStatistics {
                    total_pages: row.get::<_, i64>(0)? as u64,
                    total_characters: row.get::<_, i64>(1)? as u64,
                    first_crawl_time: row.get(2)?,
                    last_crawl_time: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }
}
