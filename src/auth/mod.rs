//! Authentication for crawled sites
//!
//! The [`Authenticator`] owns the session's [`AuthState`] and knows how to
//! establish it and, in `auto_cookies` mode, how to re-establish it after the
//! server lets it expire.
//!
//! # Modes
//!
//! - `none`: nothing to do
//! - `basic`, `headers`, `cookies`: static credentials, applied by the HTTP
//!   session when it is built and never refreshed
//! - `auto_cookies`: form login, performed eagerly when no initial cookies
//!   are configured and again whenever a page reports an expired session

mod expiry;
mod login;

pub use expiry::{ExpiryDetector, HeuristicExpiryDetector};
pub use login::LoginForm;

use crate::config::{AuthConfig, AuthMode};
use crate::crawler::{CrawlObserver, HttpResponse, HttpSession};
use crate::state::{AuthState, CredentialMaterial};
use crate::ConfigError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

/// Why a login attempt did not produce a usable session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("login request failed: {0}")]
    Transport(String),

    #[error("login rejected with HTTP {status}")]
    Rejected { status: u16 },

    #[error("login returned HTTP {status} but no session cookies were set")]
    NoCookies { status: u16 },

    #[error("no login form configured")]
    NotConfigured,
}

/// How credentials are obtained for this crawl
#[derive(Debug)]
enum Strategy {
    None,
    Static(CredentialMaterial),
    AutoRefresh {
        form: LoginForm,
        initial_cookies: Vec<String>,
    },
}

/// Auth state plus a counter bumped on every successful login
///
/// Workers remember the generation they fetched under. When several of them
/// hit an expired session at once, only the first re-logs in; the rest see a
/// newer generation and just retry.
#[derive(Debug, Default)]
struct SessionSlot {
    state: AuthState,
    generation: u64,
}

/// Establishes and refreshes the crawl's authenticated session
pub struct Authenticator {
    strategy: Strategy,
    http: Arc<dyn HttpSession>,
    detector: Arc<dyn ExpiryDetector>,
    timeout: Duration,
    slot: Mutex<SessionSlot>,
}

impl Authenticator {
    /// Creates an authenticator for the configured mode
    ///
    /// # Arguments
    ///
    /// * `config` - Auth settings
    /// * `http` - Session shared with the coordinator; logins must land in the same cookie jar
    /// * `timeout` - Deadline for each login request
    pub fn from_config(
        config: &AuthConfig,
        http: Arc<dyn HttpSession>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let strategy = match config.mode {
            AuthMode::None => Strategy::None,
            AuthMode::Basic => Strategy::Static(CredentialMaterial::Basic {
                username: config.username.clone().unwrap_or_default(),
            }),
            AuthMode::Headers => Strategy::Static(CredentialMaterial::BearerHeader),
            AuthMode::Cookies => Strategy::Static(CredentialMaterial::Cookies(
                config.cookies.keys().cloned().collect(),
            )),
            AuthMode::AutoCookies => Strategy::AutoRefresh {
                form: LoginForm::from_config(config)?,
                initial_cookies: config.cookies.keys().cloned().collect(),
            },
        };

        Ok(Self {
            strategy,
            http,
            detector: Arc::new(HeuristicExpiryDetector::from_config(&config.expiry)),
            timeout,
            slot: Mutex::new(SessionSlot::default()),
        })
    }

    /// Replaces the expiry heuristic
    pub fn with_detector(mut self, detector: Arc<dyn ExpiryDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// True when expired sessions can be recovered by logging in again
    pub fn can_refresh(&self) -> bool {
        matches!(self.strategy, Strategy::AutoRefresh { .. })
    }

    /// Current session state
    pub async fn state(&self) -> AuthState {
        self.slot.lock().await.state.clone()
    }

    /// Login generation to pass back into [`Authenticator::refresh`]
    pub async fn generation(&self) -> u64 {
        self.slot.lock().await.generation
    }

    /// Puts initial credentials in place before the first page is fetched
    ///
    /// In `auto_cookies` mode without initial cookies this performs an eager
    /// login. A failed eager login is reported and logged, never returned: the
    /// crawl proceeds and re-login is tried again on the first expired page.
    pub async fn establish(&self, observer: &dyn CrawlObserver) {
        let mut slot = self.slot.lock().await;

        match &self.strategy {
            Strategy::None => {
                tracing::debug!("No authentication configured");
            }
            Strategy::Static(material) => {
                slot.state = AuthState::Authenticated(material.clone());
                tracing::info!("Using static credentials: {}", slot.state);
            }
            Strategy::AutoRefresh {
                initial_cookies, ..
            } if !initial_cookies.is_empty() => {
                slot.state =
                    AuthState::Authenticated(CredentialMaterial::Cookies(initial_cookies.clone()));
                tracing::info!("Auto-refresh configured with initial cookies");
            }
            Strategy::AutoRefresh { form, .. } => {
                if self.login(form, &mut slot, observer).await.is_err() {
                    tracing::warn!("Initial login failed, will retry on first expired page");
                }
            }
        }
    }

    /// Applies the expiry heuristic to a response
    ///
    /// Always false for modes that can not refresh: expired static
    /// credentials surface as ordinary HTTP failures.
    pub fn is_expired(&self, requested: &Url, response: &HttpResponse) -> bool {
        self.can_refresh() && self.detector.is_expired(requested, response)
    }

    /// Logs in again after a page reported an expired session
    ///
    /// `seen_generation` is the value of [`Authenticator::generation`] read
    /// before the failed fetch. If another worker has already logged in since
    /// then, no new login is attempted.
    pub async fn refresh(
        &self,
        seen_generation: u64,
        observer: &dyn CrawlObserver,
    ) -> Result<(), LoginError> {
        let Strategy::AutoRefresh { form, .. } = &self.strategy else {
            return Err(LoginError::NotConfigured);
        };

        let mut slot = self.slot.lock().await;
        if slot.generation != seen_generation {
            tracing::debug!("Session already refreshed by another worker");
            return Ok(());
        }

        slot.state = AuthState::Expired;
        tracing::info!("Session expired, logging in again");
        self.login(form, &mut slot, observer).await
    }

    async fn login(
        &self,
        form: &LoginForm,
        slot: &mut SessionSlot,
        observer: &dyn CrawlObserver,
    ) -> Result<(), LoginError> {
        let outcome = form.submit(self.http.as_ref(), self.timeout).await;
        observer.on_login_attempt(form.login_url(), &outcome).await;

        outcome.map(|_| {
            let names = self
                .http
                .cookies(form.login_url())
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            slot.state = AuthState::Authenticated(CredentialMaterial::Cookies(names));
            slot.generation += 1;
        })
    }
}
