//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The HTTP session adapter shared by page fetches and logins
//! - The breadth-first frontier
//! - HTML text and link extraction
//! - Request pacing behind a single politeness gate
//! - Overall crawl coordination and progress observers

mod coordinator;
mod fetcher;
mod frontier;
mod observer;
mod parser;
mod scheduler;

pub use coordinator::{Coordinator, CrawlReport, CrawledPage, FetchFailure, PageResult};
pub use fetcher::{HttpResponse, HttpSession, ReqwestSession};
pub use frontier::Frontier;
pub use observer::{CrawlObserver, NoopObserver, TracingObserver};
pub use parser::{extract_page, find_hidden_token, normalize_text, Extraction};
pub use scheduler::{DelayPolicy, PolitenessGate};

use crate::config::Config;
use crate::SitewalkError;

/// Runs a complete crawl with the default session and no sinks
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran (individual pages may still have failed)
/// * `Err(SitewalkError)` - The crawl could not start
///
/// # Example
///
/// ```no_run
/// use sitewalk::config::load_config;
/// use sitewalk::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sitewalk.toml"))?;
/// let report = crawl(config).await?;
/// println!("{} pages", report.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlReport, SitewalkError> {
    Ok(Coordinator::new(config)?.run().await)
}
