//! HTTP session adapter
//!
//! The coordinator and the authenticator never talk to reqwest directly. They
//! go through [`HttpSession`], which keeps cookies and default headers across
//! requests and reports every response as a plain [`HttpResponse`]. This keeps
//! the crawl core testable with scripted sessions.

use crate::config::{AuthMode, Config};
use crate::{ConfigError, FetchError, SitewalkError};
use async_trait::async_trait;
use rand::Rng;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Browser user agents rotated through in stealth mode
const STEALTH_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code of the final response
    pub status: u16,

    /// URL of the final response after redirects
    pub final_url: Url,

    /// Response headers
    pub headers: HeaderMap,

    /// Decoded response body
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An HTTP client that persists cookies and headers across calls
#[async_trait]
pub trait HttpSession: Send + Sync {
    /// Sends a GET request, following redirects, with a hard deadline
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError>;

    /// Sends an `application/x-www-form-urlencoded` POST
    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError>;

    /// Cookies the session would send to `url`, as name/value pairs
    fn cookies(&self, url: &Url) -> Vec<(String, String)>;
}

/// [`HttpSession`] backed by a reqwest client with a shared cookie jar
pub struct ReqwestSession {
    client: Client,
    jar: Arc<Jar>,
    basic_auth: Option<(String, String)>,
}

impl ReqwestSession {
    /// Builds the session described by the configuration
    ///
    /// # Session setup
    ///
    /// - Stealth mode sends browser-like headers and a user agent picked at
    ///   random; otherwise the configured crawler identity is sent
    /// - `headers` mode adds `Authorization: Bearer <token>` to every request
    /// - `basic` mode adds HTTP Basic credentials to every request
    /// - `cookies` and `auto_cookies` modes seed the jar with the configured
    ///   cookies for the seed origin (and the login origin if different)
    ///
    /// # Returns
    ///
    /// * `Ok(ReqwestSession)` - Ready-to-use session
    /// * `Err(SitewalkError)` - A header value is unusable or the client failed to build
    pub fn from_config(config: &Config) -> Result<Self, SitewalkError> {
        let auth = &config.auth;
        let mut headers = if config.crawler.stealth {
            stealth_headers()
        } else {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::USER_AGENT,
                header_value("user-agent", &config.user_agent.header_value())?,
            );
            headers
        };

        if auth.mode == AuthMode::Headers {
            if let Some(token) = &auth.bearer_token {
                let mut value = header_value("bearer-token", &format!("Bearer {}", token))?;
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        let jar = Arc::new(Jar::default());
        if matches!(auth.mode, AuthMode::Cookies | AuthMode::AutoCookies) {
            let mut targets = vec![Url::parse(&config.crawler.seed_url)?];
            if let Some(login_url) = &auth.login_url {
                targets.push(Url::parse(login_url)?);
            }

            for (name, value) in &auth.cookies {
                for target in &targets {
                    jar.add_cookie_str(&format!("{}={}; Path=/", name, value), target);
                }
            }
        }

        let basic_auth = match (auth.mode, &auth.username, &auth.password) {
            (AuthMode::Basic, Some(username), Some(password)) => {
                Some((username.clone(), password.clone()))
            }
            _ => None,
        };

        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .connect_timeout(config.crawler.request_timeout())
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            jar,
            basic_auth,
        })
    }

    fn with_basic_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.basic_auth {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }
}

#[async_trait]
impl HttpSession for ReqwestSession {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let request = self.with_basic_auth(self.client.get(url.clone()).timeout(timeout));
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        read_response(response, timeout).await
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let request = self.with_basic_auth(
            self.client
                .post(url.clone())
                .headers(headers)
                .form(form)
                .timeout(timeout),
        );
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        read_response(response, timeout).await
    }

    fn cookies(&self, url: &Url) -> Vec<(String, String)> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().map(parse_cookie_header).ok())
            .unwrap_or_default()
    }
}

/// Reads status, final URL, headers and body out of a reqwest response
async fn read_response(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<HttpResponse, FetchError> {
    let status = response.status().as_u16();
    let final_url = response.url().clone();
    let headers = response.headers().clone();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, timeout))?;

    Ok(HttpResponse {
        status,
        final_url,
        headers,
        body,
    })
}

/// Maps a reqwest failure onto the transport error the crawl records
fn transport_error(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Transport(format!("request timed out after {:?}", timeout))
    } else if error.is_connect() {
        FetchError::Transport(format!("connection failed: {}", error))
    } else if error.is_redirect() {
        FetchError::Transport(format!("redirect error: {}", error))
    } else {
        FetchError::Transport(error.to_string())
    }
}

/// Headers a desktop browser would send on a top-level navigation
fn stealth_headers() -> HeaderMap {
    let index = rand::rng().random_range(0..STEALTH_USER_AGENTS.len());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(STEALTH_USER_AGENTS[index]),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue, SitewalkError> {
    HeaderValue::from_str(value).map_err(|_| {
        SitewalkError::Config(ConfigError::Validation(format!(
            "{} is not a valid HTTP header value",
            field
        )))
    })
}

/// Splits a `Cookie` header (`a=1; b=2`) into name/value pairs
fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
