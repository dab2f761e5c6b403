use crate::UrlError;
use url::Url;

/// File extensions that are never crawled (binary downloads)
pub const DENIED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "zip", "rar", "doc", "docx", "xls", "xlsx",
];

/// Parses a seed URL into a crawl target
///
/// Only `http` and `https` are accepted, a host is required, and the fragment
/// is dropped.
///
/// # Examples
///
/// ```
/// use sitewalk::url::normalize_url;
///
/// let url = normalize_url("https://example.com/start#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/start");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves an `href` against the page it was found on and drops the fragment
///
/// Standard base-URL resolution applies, so relative paths, `../` segments,
/// protocol-relative and absolute references all work. Returns `None` when the
/// reference cannot be resolved at all.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let mut resolved = base_url.join(href.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Returns true when the URL path ends in a denied binary extension
///
/// The comparison is case-insensitive and looks at the path only, so
/// `/report.PDF` is denied while `/docs` and `/page?file=a.pdf` are not.
pub fn has_denied_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();

    DENIED_EXTENSIONS.iter().any(|ext| {
        path.strip_suffix(ext)
            .map(|rest| rest.ends_with('.'))
            .unwrap_or(false)
    })
}
