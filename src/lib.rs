//! Sitewalk: a single-domain breadth-first crawler
//!
//! This crate crawls one site starting from a seed URL, extracts readable text and
//! in-domain links from every page, and hands the results to optional sinks (SQLite
//! persistence, a vector index). Authenticated sessions are supported, including
//! cookie sessions that are refreshed by logging in again when they expire.

pub mod auth;
pub mod config;
pub mod crawler;
pub mod index;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

#[cfg(test)]
mod test_support;

use thiserror::Error;

/// Main error type for Sitewalk operations
///
/// Everything in here is fatal to a crawl and can only happen before the main
/// loop starts or at the very edges (opening sinks, writing the export file).
/// Per-page problems are reported as [`FetchError`] instead.
#[derive(Debug, Error)]
pub enum SitewalkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Vector index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Why a single page could not be turned into a result
///
/// None of these stop the crawl; the coordinator records them next to the URL
/// and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection failure, DNS failure, timeout or an unreadable body
    #[error("transport error: {0}")]
    Transport(String),

    /// The final response was not a 2xx
    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    /// The session was still expired after one re-login and one retry
    #[error("authentication expired (HTTP {status} at {final_url})")]
    AuthExpired { status: u16, final_url: String },

    /// Re-login was needed but did not succeed
    #[error("re-login failed: {0}")]
    Login(#[from] auth::LoginError),

    /// Fetching or extracting the page panicked
    #[error("page worker panicked: {0}")]
    Panicked(String),

    /// The crawl was cancelled while the request was in flight
    #[error("cancelled")]
    Cancelled,
}

/// Result type alias for Sitewalk operations
pub type Result<T> = std::result::Result<T, SitewalkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, PageResult};
pub use state::{AuthState, CrawlState};
pub use crate::url::{origin_of, CrawlScope};
