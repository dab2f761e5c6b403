//! Crawl progress observers
//!
//! The crawl core never prints. Progress and diagnostics are reported through
//! [`CrawlObserver`] callbacks; the binary installs [`TracingObserver`], tests
//! install recorders.

use crate::auth::LoginError;
use crate::crawler::PageResult;
use crate::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Receives crawl events as they happen
///
/// Every method has a no-op default so implementors only override what they
/// care about.
#[async_trait]
pub trait CrawlObserver: Send + Sync {
    /// A page was fetched and extracted successfully
    async fn on_page_fetched(&self, _page: &PageResult) {}

    /// A page could not be turned into a result
    async fn on_error(&self, _url: &Url, _error: &FetchError) {}

    /// A login was attempted; `Ok` carries the number of cookies held afterwards
    async fn on_login_attempt(&self, _login_url: &Url, _outcome: &Result<usize, LoginError>) {}

    /// The politeness gate is about to hold the next dispatch for `delay`
    async fn on_delay(&self, _delay: Duration) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

#[async_trait]
impl CrawlObserver for NoopObserver {}

/// Observer that reports events as `tracing` log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

#[async_trait]
impl CrawlObserver for TracingObserver {
    async fn on_page_fetched(&self, page: &PageResult) {
        tracing::info!(
            url = %page.url,
            chars = page.full_text_length,
            links = page.extracted_link_count,
            "Fetched {}",
            if page.title.is_empty() { "(untitled)" } else { &page.title }
        );
    }

    async fn on_error(&self, url: &Url, error: &FetchError) {
        tracing::warn!(url = %url, "Failed to crawl page: {}", error);
    }

    async fn on_login_attempt(&self, login_url: &Url, outcome: &Result<usize, LoginError>) {
        match outcome {
            Ok(cookies) => {
                tracing::info!(url = %login_url, cookies, "Login successful")
            }
            Err(e) => tracing::warn!(url = %login_url, "Login failed: {}", e),
        }
    }

    async fn on_delay(&self, delay: Duration) {
        tracing::trace!("Waiting {:.2}s before next request", delay.as_secs_f64());
    }
}
