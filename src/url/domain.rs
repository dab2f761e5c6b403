use url::Url;

/// Builds the `scheme://host[:port]` origin string used for domain confinement
///
/// The port only appears when the URL carries a non-default one, so
/// `https://example.com:443/` and `https://example.com/` share an origin.
/// Returns `None` for URLs without a host (e.g. `mailto:`).
///
/// # Examples
///
/// ```
/// use sitewalk::url::origin_of;
/// use url::Url;
///
/// let url = Url::parse("http://a.test:8080/docs?q=1").unwrap();
/// assert_eq!(origin_of(&url).as_deref(), Some("http://a.test:8080"));
/// ```
pub fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;

    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
