//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns the frontier and runs the dispatch loop:
//! - Pops the next URL and marks it visited
//! - Waits for the politeness gate
//! - Hands the URL to a worker task that fetches it (re-logging in once if the
//!   session expired) and extracts text and links
//! - Records the page or the failure, forwards pages to sinks and feeds new
//!   links back into the frontier
//!
//! Only the dispatch loop ever touches the frontier, so pop, mark-visited and
//! offer never interleave across workers.

use crate::auth::{Authenticator, ExpiryDetector};
use crate::config::Config;
use crate::crawler::fetcher::{HttpResponse, HttpSession, ReqwestSession};
use crate::crawler::frontier::Frontier;
use crate::crawler::observer::{CrawlObserver, TracingObserver};
use crate::crawler::parser::extract_page;
use crate::crawler::scheduler::{DelayPolicy, PolitenessGate};
use crate::output::PageSink;
use crate::state::{AuthState, CrawlState};
use crate::url::{origin_of, CrawlScope};
use crate::{FetchError, SitewalkError};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Summary of one successfully crawled page
///
/// This is the shape written to the JSON results export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub url: String,

    /// Trimmed `<title>` text, empty when the page has none
    pub title: String,

    /// Normalized text, truncated to the configured preview length
    pub text: String,

    /// Length of the full normalized text, in characters
    pub full_text_length: usize,

    /// Number of in-scope links found on the page (before deduplication)
    pub extracted_link_count: usize,
}

/// A crawled page as handed to sinks
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub result: PageResult,

    /// Full normalized text
    pub content: String,

    /// In-scope links in document order
    pub links: Vec<Url>,
}

impl CrawledPage {
    /// Per-page metadata stored next to the content by persistent sinks
    ///
    /// `{"domain": "scheme://host[:port]", "path": "/...", "links_count": n}`
    pub fn metadata(&self) -> serde_json::Value {
        let parsed = Url::parse(&self.result.url).ok();
        serde_json::json!({
            "domain": parsed.as_ref().and_then(origin_of),
            "path": parsed.as_ref().map(|url| url.path()),
            "links_count": self.result.extracted_link_count,
        })
    }
}

/// A URL that could not be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: String,
    pub error: FetchError,
}

/// What a finished crawl hands back to its caller
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// `Completed`, or `Cancelled` when the token fired first
    pub state: CrawlState,

    /// Successful pages in the order they finished
    pub pages: Vec<PageResult>,

    /// Pages that failed, with the reason
    pub failures: Vec<FetchFailure>,

    /// Number of URLs dispatched; always `pages + failures + interrupted`
    pub visited_count: usize,

    /// Frontier entries never dispatched
    pub pending: Vec<Url>,

    /// Dispatched URLs whose fetch was cut short by cancellation
    pub interrupted: Vec<Url>,

    /// Session state at the end of the crawl
    pub auth_state: AuthState,

    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    scope: CrawlScope,
    session: Arc<dyn HttpSession>,
    auth: Authenticator,
    sinks: Vec<Arc<dyn PageSink>>,
    observer: Arc<dyn CrawlObserver>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator backed by a real HTTP session
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SitewalkError)` - Unusable seed, credentials or client settings
    pub fn new(config: Config) -> Result<Self, SitewalkError> {
        let session = Arc::new(ReqwestSession::from_config(&config)?);
        Self::with_session(config, session)
    }

    /// Creates a coordinator on top of an existing session
    ///
    /// The session is shared with the authenticator, so logins and page
    /// fetches see the same cookies.
    pub fn with_session(
        config: Config,
        session: Arc<dyn HttpSession>,
    ) -> Result<Self, SitewalkError> {
        let scope = CrawlScope::from_seed(&config.crawler.seed_url)?;
        let auth = Authenticator::from_config(
            &config.auth,
            Arc::clone(&session),
            config.crawler.request_timeout(),
        )?;

        Ok(Self {
            config: Arc::new(config),
            scope,
            session,
            auth,
            sinks: Vec::new(),
            observer: Arc::new(TracingObserver),
            cancel: CancellationToken::new(),
        })
    }

    /// Adds a sink that receives every successfully crawled page
    pub fn with_sink(mut self, sink: Arc<dyn PageSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Overrides the session expiry heuristic
    pub fn with_expiry_detector(mut self, detector: Arc<dyn ExpiryDetector>) -> Self {
        self.auth = self.auth.with_detector(detector);
        self
    }

    /// Uses `token` to stop the crawl from outside
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn scope(&self) -> &CrawlScope {
        &self.scope
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// Per-page problems never end the crawl; they are collected in
    /// [`CrawlReport::failures`].
    pub async fn run(self) -> CrawlReport {
        let start_time = Instant::now();
        let crawler = &self.config.crawler;
        let mut state = CrawlState::Idle;
        advance(&mut state, CrawlState::Running);

        tracing::info!(
            "Starting crawl of {} (max pages: {}, workers: {})",
            self.scope.seed(),
            crawler
                .max_pages
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
            crawler.workers
        );

        self.auth.establish(self.observer.as_ref()).await;

        let worker = Arc::new(PageWorker {
            session: Arc::clone(&self.session),
            auth: Arc::new(self.auth),
            scope: self.scope.clone(),
            observer: Arc::clone(&self.observer),
            cancel: self.cancel.clone(),
            timeout: crawler.request_timeout(),
            preview_length: crawler.preview_length,
        });

        let mut progress = Progress {
            frontier: Frontier::seed(self.scope.seed().clone()),
            pages: Vec::new(),
            failures: Vec::new(),
            interrupted: Vec::new(),
            sinks: self.sinks,
            observer: Arc::clone(&self.observer),
        };
        let mut gate = PolitenessGate::new(DelayPolicy::from_config(crawler));
        let mut in_flight: JoinSet<(Url, Result<CrawledPage, FetchError>)> = JoinSet::new();
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let cap_reached = crawler
                .max_pages
                .is_some_and(|max| progress.frontier.visited_len() >= max);
            let can_dispatch = !cap_reached
                && !progress.frontier.is_exhausted()
                && in_flight.len() < crawler.workers;

            if !can_dispatch {
                if in_flight.is_empty() {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    Some(joined) = in_flight.join_next() => {
                        progress.absorb(joined).await;
                        gate.hold();
                    }
                }
                continue;
            }

            if let Some(wait) = gate.remaining() {
                self.observer.on_delay(wait).await;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    progress.absorb(joined).await;
                    gate.hold();
                    continue;
                }
                _ = gate.ready() => {}
            }

            let Some(url) = progress.frontier.pop() else {
                continue;
            };
            if progress.frontier.is_visited(&url) {
                continue;
            }
            progress.frontier.mark_visited(&url);
            gate.hold();

            tracing::debug!("Dispatching {}", url);
            let worker = Arc::clone(&worker);
            in_flight.spawn(async move {
                let target = url.clone();
                let outcome = match tokio::spawn(async move { worker.crawl(&target).await }).await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Page worker for {} panicked: {}", url, e);
                        Err(FetchError::Panicked(e.to_string()))
                    }
                };
                (url, outcome)
            });
        }

        if cancelled {
            tracing::info!("Crawl cancelled, waiting for {} in-flight pages", in_flight.len());
        }
        while let Some(joined) = in_flight.join_next().await {
            progress.absorb(joined).await;
        }

        advance(
            &mut state,
            if cancelled {
                CrawlState::Cancelled
            } else {
                CrawlState::Completed
            },
        );

        let report = CrawlReport {
            state,
            visited_count: progress.frontier.visited_len(),
            pending: progress.frontier.pending().cloned().collect(),
            pages: progress.pages,
            failures: progress.failures,
            interrupted: progress.interrupted,
            auth_state: worker.auth.state().await,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl {}: {} pages, {} failures, {} interrupted, {} pending, in {:?}",
            report.state,
            report.pages.len(),
            report.failures.len(),
            report.interrupted.len(),
            report.pending.len(),
            report.elapsed
        );

        report
    }
}

fn advance(state: &mut CrawlState, next: CrawlState) {
    debug_assert!(state.can_transition_to(next), "{} -> {}", state, next);
    *state = next;
}

/// Everything the dispatch loop mutates when a page finishes
struct Progress {
    frontier: Frontier,
    pages: Vec<PageResult>,
    failures: Vec<FetchFailure>,
    interrupted: Vec<Url>,
    sinks: Vec<Arc<dyn PageSink>>,
    observer: Arc<dyn CrawlObserver>,
}

impl Progress {
    async fn absorb(
        &mut self,
        joined: Result<(Url, Result<CrawledPage, FetchError>), JoinError>,
    ) {
        let (url, outcome) = match joined {
            Ok(finished) => finished,
            Err(e) => {
                // Workers run the page pipeline in a nested task, so only
                // the runtime shutting down can land here
                tracing::error!("Page task failed: {}", e);
                return;
            }
        };

        match outcome {
            Ok(page) => {
                self.pages.push(page.result.clone());
                self.observer.on_page_fetched(&page.result).await;

                for sink in &self.sinks {
                    if let Err(e) = sink.accept(&page).await {
                        tracing::warn!("{} sink failed for {}: {}", sink.name(), url, e);
                    }
                }

                let offered = page
                    .links
                    .into_iter()
                    .filter(|link| self.frontier.offer(link.clone()))
                    .count();
                tracing::debug!(
                    "{}: {} links, {} new, {} pending",
                    url,
                    page.result.extracted_link_count,
                    offered,
                    self.frontier.pending_len()
                );
            }
            Err(FetchError::Cancelled) => {
                tracing::debug!("Fetch of {} cancelled", url);
                self.interrupted.push(url);
            }
            Err(error) => {
                self.observer.on_error(&url, &error).await;
                self.failures.push(FetchFailure {
                    url: url.to_string(),
                    error,
                });
            }
        }
    }
}

/// Fetch-and-extract pipeline shared by all worker tasks
struct PageWorker {
    session: Arc<dyn HttpSession>,
    auth: Arc<Authenticator>,
    scope: CrawlScope,
    observer: Arc<dyn CrawlObserver>,
    cancel: CancellationToken,
    timeout: Duration,
    preview_length: usize,
}

impl PageWorker {
    async fn crawl(&self, url: &Url) -> Result<CrawledPage, FetchError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            fetched = self.fetch_with_reauth(url) => fetched.map(|response| self.extract(url, &response)),
        }
    }

    /// Fetches `url`, re-logging in and retrying exactly once on expiry
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error | Fail with `Transport` |
    /// | Session expired, first attempt | Re-login, then retry once |
    /// | Re-login failed | Fail with `Login` |
    /// | Session expired on the retry | Fail with `AuthExpired` |
    /// | Non-2xx final status | Fail with `HttpStatus` |
    async fn fetch_with_reauth(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        let generation = self.auth.generation().await;
        let mut response = self.session.get(url, self.timeout).await?;

        if self.auth.is_expired(url, &response) {
            tracing::info!(
                "Session expired while fetching {} (HTTP {}, landed on {})",
                url,
                response.status,
                response.final_url
            );
            self.auth.refresh(generation, self.observer.as_ref()).await?;

            response = self.session.get(url, self.timeout).await?;
            if self.auth.is_expired(url, &response) {
                return Err(FetchError::AuthExpired {
                    status: response.status,
                    final_url: response.final_url.to_string(),
                });
            }
        }

        if !response.is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status,
            });
        }

        Ok(response)
    }

    /// Links resolve against the requested URL, not the post-redirect one
    fn extract(&self, url: &Url, response: &HttpResponse) -> CrawledPage {
        let extraction = extract_page(&response.body, url, &self.scope);

        CrawledPage {
            result: PageResult {
                url: url.to_string(),
                title: extraction.title,
                text: extraction.text.chars().take(self.preview_length).collect(),
                full_text_length: extraction.text.chars().count(),
                extracted_link_count: extraction.links.len(),
            },
            content: extraction.text,
            links: extraction.links,
        }
    }
}
