//! Output module for crawl results
//!
//! This module handles:
//! - The sink interface crawled pages are forwarded through
//! - Persisting pages to SQLite as they arrive
//! - Exporting page results as JSON
//! - Rendering statistics and run summaries

mod export;
mod sqlite_output;
pub mod stats;
mod traits;

pub use export::write_results;
pub use sqlite_output::SqlitePageSink;
pub use stats::{format_report, format_statistics, load_statistics, print_statistics};
pub use traits::{OutputError, OutputResult, PageSink};
