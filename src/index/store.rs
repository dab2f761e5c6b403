//! SQLite-backed vector table

use crate::config::VectorStoreConfig;
use crate::crawler::CrawledPage;
use crate::index::{embedder_from_config, Embedder, IndexError, IndexResult, SearchHit};
use crate::output::PageSink;
use crate::SitewalkError;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Documents are cut to this many characters before embedding
pub const MAX_DOCUMENT_CHARS: usize = 30_000;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS vectors (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    metadata TEXT NOT NULL,
    embedding BLOB NOT NULL,
    PRIMARY KEY (collection, id)
);
"#;

/// url, title, metadata JSON, embedding blob
type StoredRow = (String, String, String, Vec<u8>);

/// Stable document id for a URL (hex SHA-256)
pub fn document_id(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// A named collection of page embeddings
///
/// SQLite work issued from the async methods runs on the blocking pool.
pub struct VectorIndex {
    conn: Arc<Mutex<Connection>>,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl VectorIndex {
    /// Opens (or creates) the index database at `path`
    pub fn open(
        path: &Path,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> IndexResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::with_connection(conn, collection, embedder)
    }

    /// Opens the index described by `[vector-store]`
    pub fn from_config(config: &VectorStoreConfig) -> IndexResult<Self> {
        let embedder = embedder_from_config(config)?;
        tracing::info!(
            "Vector index '{}' at {} using {} embedder",
            config.collection,
            config.path,
            embedder.name()
        );
        Self::open(Path::new(&config.path), &config.collection, embedder)
    }

    /// Creates an in-memory index (for testing)
    #[cfg(test)]
    pub fn new_in_memory(collection: &str, embedder: Arc<dyn Embedder>) -> IndexResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, collection, embedder)
    }

    fn with_connection(
        conn: Connection,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> IndexResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
            embedder,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn lock(&self) -> IndexResult<MutexGuard<'_, Connection>> {
        lock_connection(&self.conn)
    }

    /// Embeds and stores a page, replacing any earlier entry for the URL
    ///
    /// The embedded document is `title`, a blank line, then `content`, cut to
    /// [`MAX_DOCUMENT_CHARS`]. `url`, `title` and `text_length` are merged into
    /// `metadata` (which must be a JSON object or null).
    pub async fn add_page(
        &self,
        url: &str,
        title: &str,
        content: &str,
        metadata: Option<Value>,
    ) -> IndexResult<()> {
        let document: String = format!("{}\n\n{}", title, content)
            .chars()
            .take(MAX_DOCUMENT_CHARS)
            .collect();
        let embedding = self.embedder.embed(&document).await?;

        let mut metadata = match metadata {
            Some(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        metadata.insert("url".to_string(), json!(url));
        metadata.insert("title".to_string(), json!(title));
        metadata.insert("text_length".to_string(), json!(content.chars().count()));
        let metadata = serde_json::to_string(&metadata)?;

        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();
        let url = url.to_string();
        let title = title.to_string();
        tokio::task::spawn_blocking(move || -> IndexResult<()> {
            let conn = lock_connection(&conn)?;
            conn.execute(
                "INSERT OR REPLACE INTO vectors (collection, id, url, title, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    collection,
                    document_id(&url),
                    url,
                    title,
                    metadata,
                    encode_vector(&embedding)
                ],
            )?;
            Ok(())
        })
        .await?
    }

    /// Ranks stored pages by cosine distance to `query`, nearest first
    pub async fn search(&self, query: &str, top_k: usize) -> IndexResult<Vec<SearchHit>> {
        let query_vector = self.embedder.embed(query).await?;

        let conn = Arc::clone(&self.conn);
        let collection = self.collection.clone();
        let rows = tokio::task::spawn_blocking(move || -> IndexResult<Vec<StoredRow>> {
            let conn = lock_connection(&conn)?;
            let mut stmt = conn.prepare(
                "SELECT url, title, metadata, embedding FROM vectors WHERE collection = ?1",
            )?;
            let rows = stmt
                .query_map(params![collection], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await??;

        let mut hits = Vec::with_capacity(rows.len());
        for (url, title, metadata, blob) in rows {
            let stored = decode_vector(&blob);
            if stored.len() != query_vector.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: stored.len(),
                    actual: query_vector.len(),
                });
            }
            hits.push(SearchHit {
                url,
                title,
                metadata: serde_json::from_str(&metadata)?,
                distance: cosine_distance(&query_vector, &stored),
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Removes the entry for `url`; returns whether one existed
    pub fn delete_page(&self, url: &str) -> IndexResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM vectors WHERE collection = ?1 AND id = ?2",
            params![self.collection, document_id(url)],
        )?;
        Ok(removed > 0)
    }

    /// Empties this collection
    pub fn clear(&self) -> IndexResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM vectors WHERE collection = ?1",
            params![self.collection],
        )?;
        Ok(())
    }

    /// Number of pages in this collection
    pub fn count(&self) -> IndexResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM vectors WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[async_trait]
impl PageSink for VectorIndex {
    fn name(&self) -> &str {
        "vector-index"
    }

    async fn accept(&self, page: &CrawledPage) -> Result<(), SitewalkError> {
        self.add_page(
            &page.result.url,
            &page.result.title,
            &page.content,
            Some(page.metadata()),
        )
        .await?;
        Ok(())
    }
}

fn lock_connection(conn: &Mutex<Connection>) -> IndexResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| IndexError::LockPoisoned)
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// `1 - cos(a, b)`; a zero vector is at distance 1 from everything
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::HashingEmbedder;
    use crate::PageResult;

    fn index() -> VectorIndex {
        VectorIndex::new_in_memory("pages", Arc::new(HashingEmbedder::new(128))).unwrap()
    }

    #[test]
    fn test_document_id_is_sha256_hex() {
        let id = document_id("https://example.com/");
        assert_eq!(id.len(), 64);
        assert_eq!(id, document_id("https://example.com/"));
        assert_ne!(id, document_id("https://example.com/a"));
    }

    #[test]
    fn test_vector_blob_round_trip() {
        let v = vec![0.5, -1.25, 3.0];
        assert_eq!(decode_vector(&encode_vector(&v)), v);
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[tokio::test]
    async fn test_search_ranks_by_distance() {
        let index = index();
        index
            .add_page(
                "https://example.com/deploy",
                "Deploying",
                "how to deploy the service to production",
                None,
            )
            .await
            .unwrap();
        index
            .add_page(
                "https://example.com/lunch",
                "Lunch menu",
                "soup salad sandwiches",
                None,
            )
            .await
            .unwrap();

        let hits = index.search("deploy to production", 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://example.com/deploy");
        assert!(hits[0].distance <= hits[1].distance);
        assert_eq!(hits[0].metadata["title"], "Deploying");
        assert_eq!(hits[0].metadata["text_length"], 39);
    }

    #[tokio::test]
    async fn test_add_page_replaces_same_url() {
        let index = index();
        index
            .add_page("https://example.com/a", "One", "first", None)
            .await
            .unwrap();
        index
            .add_page("https://example.com/a", "Two", "second", Some(json!({"k": 1})))
            .await
            .unwrap();

        assert_eq!(index.count().unwrap(), 1);
        let hits = index.search("second", 1).await.unwrap();
        assert_eq!(hits[0].title, "Two");
        assert_eq!(hits[0].metadata["k"], 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let index = index();
        for url in ["https://example.com/a", "https://example.com/b"] {
            index.add_page(url, "", "text", None).await.unwrap();
        }

        assert!(index.delete_page("https://example.com/a").unwrap());
        assert!(!index.delete_page("https://example.com/a").unwrap());
        assert_eq!(index.count().unwrap(), 1);

        index.clear().unwrap();
        assert_eq!(index.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(32));
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("vectors.db");

        let a = VectorIndex::open(&path, "a", embedder.clone()).unwrap();
        let b = VectorIndex::open(&path, "b", embedder).unwrap();
        a.add_page("https://example.com/", "", "text", None)
            .await
            .unwrap();

        assert_eq!(a.count().unwrap(), 1);
        assert_eq!(b.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_page_sink_stores_full_content() {
        let index = index();
        let page = CrawledPage {
            result: PageResult {
                url: "https://example.com/".to_string(),
                title: "Home".to_string(),
                text: "Wel".to_string(),
                full_text_length: 7,
                extracted_link_count: 2,
            },
            content: "Welcome".to_string(),
            links: Vec::new(),
        };

        index.accept(&page).await.unwrap();

        let hits = index.search("welcome", 1).await.unwrap();
        assert_eq!(hits[0].metadata["text_length"], 7);
        assert_eq!(hits[0].metadata["links_count"], 2);
        assert_eq!(hits[0].metadata["domain"], "https://example.com");
        assert_eq!(hits[0].metadata["path"], "/");
    }
}
