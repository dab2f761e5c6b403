//! Session expiry detection
//!
//! Whether a response means "your session is gone" is a heuristic. It is kept
//! behind [`ExpiryDetector`] so sites with their own signals can plug in a
//! better one.

use crate::config::ExpiryConfig;
use crate::crawler::HttpResponse;
use url::Url;

/// Decides whether a response indicates an expired authenticated session
pub trait ExpiryDetector: Send + Sync {
    /// `requested` is the URL that was asked for; `response` is what came back
    /// after redirects
    fn is_expired(&self, requested: &Url, response: &HttpResponse) -> bool;
}

/// Status-code and login-redirect heuristic
///
/// A response counts as expired when:
/// - its status is one of the configured statuses (401 and 403 by default), or
/// - it was redirected away from the requested URL and the final URL's path
///   contains a login keyword (case-insensitive substring match)
///
/// A redirect to an unrelated page whose path merely contains "auth" will be a
/// false positive.
#[derive(Debug, Clone)]
pub struct HeuristicExpiryDetector {
    statuses: Vec<u16>,
    login_keywords: Vec<String>,
}

impl HeuristicExpiryDetector {
    pub fn new(statuses: Vec<u16>, login_keywords: Vec<String>) -> Self {
        Self {
            statuses,
            login_keywords: login_keywords
                .into_iter()
                .map(|keyword| keyword.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ExpiryConfig) -> Self {
        Self::new(config.statuses.clone(), config.login_keywords.clone())
    }
}

impl Default for HeuristicExpiryDetector {
    fn default() -> Self {
        Self::from_config(&ExpiryConfig::default())
    }
}

impl ExpiryDetector for HeuristicExpiryDetector {
    fn is_expired(&self, requested: &Url, response: &HttpResponse) -> bool {
        if self.statuses.contains(&response.status) {
            return true;
        }

        if response.final_url == *requested {
            return false;
        }

        let path = response.final_url.path().to_lowercase();
        self.login_keywords
            .iter()
            .any(|keyword| path.contains(keyword.as_str()))
    }
}
