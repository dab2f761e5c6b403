//! URL handling module for Sitewalk
//!
//! This module resolves links found on pages, strips fragments, and decides
//! whether a URL is a valid crawl target for the current crawl.

mod domain;
mod normalize;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use domain::origin_of;
pub use normalize::{has_denied_extension, normalize_url, resolve_link, DENIED_EXTENSIONS};

/// The set of URLs a crawl is allowed to visit
///
/// A URL is in scope when it uses http(s), its `scheme://host[:port]` equals
/// the seed's exactly (no subdomain matching), and its path does not end in a
/// denied binary extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    seed: Url,
    origin: String,
}

impl CrawlScope {
    /// Builds the scope for a crawl starting at `seed_url`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlScope)` - The seed is a usable http(s) URL with a host
    /// * `Err(UrlError)` - The seed cannot start a crawl
    ///
    /// # Examples
    ///
    /// ```
    /// use sitewalk::url::CrawlScope;
    ///
    /// let scope = CrawlScope::from_seed("https://example.com/").unwrap();
    /// let page = scope.seed().clone();
    /// assert!(scope.filter_link("/a?q=1#frag", &page).is_some());
    /// assert!(scope.filter_link("https://other.com/x", &page).is_none());
    /// ```
    pub fn from_seed(seed_url: &str) -> Result<Self, UrlError> {
        let seed = normalize_url(seed_url)?;
        let origin = origin_of(&seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self { seed, origin })
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// The `scheme://host[:port]` string every target must share
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns true if the (already resolved) URL may be crawled
    pub fn accepts(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        match origin_of(url) {
            Some(origin) if origin == self.origin => {}
            _ => return false,
        }

        !has_denied_extension(url)
    }

    /// Resolves `href` against `page_url` and returns it if it is in scope
    ///
    /// Rejected links are dropped silently; that is not an error.
    pub fn filter_link(&self, href: &str, page_url: &Url) -> Option<Url> {
        resolve_link(href, page_url).filter(|url| self.accepts(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> CrawlScope {
        CrawlScope::from_seed("https://example.com/").unwrap()
    }

    #[test]
    fn test_from_seed_strips_fragment() {
        let scope = CrawlScope::from_seed("https://example.com/start#top").unwrap();
        assert_eq!(scope.seed().as_str(), "https://example.com/start");
        assert_eq!(scope.origin(), "https://example.com");
    }

    #[test]
    fn test_from_seed_rejects_bad_scheme() {
        assert!(CrawlScope::from_seed("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_cross_domain_rejected() {
        let scope = scope();
        assert!(scope
            .filter_link("https://other.com/x", scope.seed())
            .is_none());
    }

    #[test]
    fn test_fragment_stripped_on_accept() {
        let scope = scope();
        let url = scope
            .filter_link("https://example.com/a?q=1#frag", scope.seed())
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/a?q=1");
    }

    #[test]
    fn test_scheme_mismatch_rejected() {
        let scope = scope();
        assert!(scope
            .filter_link("http://example.com/a", scope.seed())
            .is_none());
    }

    #[test]
    fn test_subdomain_rejected() {
        let scope = scope();
        assert!(scope
            .filter_link("https://docs.example.com/a", scope.seed())
            .is_none());
    }

    #[test]
    fn test_port_mismatch_rejected() {
        let scope = CrawlScope::from_seed("http://127.0.0.1:8080/").unwrap();
        assert!(scope
            .filter_link("http://127.0.0.1:9090/a", scope.seed())
            .is_none());
        assert!(scope.filter_link("/a", scope.seed()).is_some());
    }

    #[test]
    fn test_extension_filter() {
        let scope = scope();
        assert!(scope
            .filter_link("https://example.com/doc.PDF", scope.seed())
            .is_none());
        assert!(scope
            .filter_link("https://example.com/docs", scope.seed())
            .is_some());
    }

    #[test]
    fn test_non_http_links_rejected() {
        let scope = scope();
        for href in ["mailto:a@example.com", "javascript:void(0)", "tel:+123"] {
            assert!(scope.filter_link(href, scope.seed()).is_none(), "{}", href);
        }
    }
}
