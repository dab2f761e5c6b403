use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Sitewalk
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub output: OutputConfig,
    #[serde(rename = "vector-store", default)]
    pub vector_store: VectorStoreConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Where the crawl starts; also defines the domain the crawl is confined to
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Maximum number of pages to visit (unbounded when absent)
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,

    /// Base delay between requests, in seconds
    #[serde(rename = "delay-seconds", default = "default_delay_seconds")]
    pub delay_seconds: f64,

    /// Randomized delays in [delay, 3 × delay] plus browser-like request headers
    #[serde(default)]
    pub stealth: bool,

    /// Deadline for every single HTTP request
    #[serde(
        rename = "request-timeout-seconds",
        default = "default_request_timeout_seconds"
    )]
    pub request_timeout_seconds: u64,

    /// Number of characters of page text kept in each result
    #[serde(rename = "preview-length", default = "default_preview_length")]
    pub preview_length: usize,

    /// Number of concurrent fetch workers behind the politeness gate
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_seconds.max(0.0)).unwrap_or(Duration::MAX)
    }
}

fn default_delay_seconds() -> f64 {
    1.0
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_preview_length() -> usize {
    1000
}

fn default_workers() -> usize {
    1
}

/// User agent identification, used when stealth mode is off
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Formats the identity as `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|url| format!("+{}", url)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Sitewalk".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

/// Supported authentication modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    None,
    Basic,
    Cookies,
    AutoCookies,
    Headers,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::Cookies => "cookies",
            Self::AutoCookies => "auto_cookies",
            Self::Headers => "headers",
        }
    }
}

/// Authentication configuration
///
/// Which fields are required depends on `mode`; see the validation rules.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Login form endpoint for `auto_cookies`
    #[serde(rename = "login-url", default)]
    pub login_url: Option<String>,

    #[serde(rename = "username-field", default = "default_username_field")]
    pub username_field: String,

    #[serde(rename = "password-field", default = "default_password_field")]
    pub password_field: String,

    /// Hidden input names searched for an anti-forgery token, in priority order
    #[serde(rename = "csrf-fields", default = "default_csrf_fields")]
    pub csrf_fields: Vec<String>,

    #[serde(rename = "bearer-token", default)]
    pub bearer_token: Option<String>,

    /// Static cookies (`cookies` mode) or initial cookies (`auto_cookies` mode)
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,

    #[serde(default)]
    pub expiry: ExpiryConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::None,
            username: None,
            password: None,
            login_url: None,
            username_field: default_username_field(),
            password_field: default_password_field(),
            csrf_fields: default_csrf_fields(),
            bearer_token: None,
            cookies: BTreeMap::new(),
            expiry: ExpiryConfig::default(),
        }
    }
}

fn default_username_field() -> String {
    "username".to_string()
}

fn default_password_field() -> String {
    "password".to_string()
}

fn default_csrf_fields() -> Vec<String> {
    ["atl_token", "csrf_token", "_csrf", "authenticity_token"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Heuristic used to decide that an authenticated session has expired
#[derive(Debug, Clone, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default = "default_expiry_statuses")]
    pub statuses: Vec<u16>,

    /// Substrings of a redirect target's path that indicate a login page
    #[serde(rename = "login-keywords", default = "default_login_keywords")]
    pub login_keywords: Vec<String>,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            statuses: default_expiry_statuses(),
            login_keywords: default_login_keywords(),
        }
    }
}

fn default_expiry_statuses() -> Vec<u16> {
    vec![401, 403]
}

fn default_login_keywords() -> Vec<String> {
    ["login", "signin", "auth", "authenticate"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON results export
    #[serde(rename = "results-path", default = "default_results_path")]
    pub results_path: String,

    /// Path to the SQLite database file; persistence is off when absent
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

fn default_results_path() -> String {
    "crawl_results.json".to_string()
}

/// Which embedding backend feeds the vector index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    #[default]
    Hashing,
    Openai,
}

/// Vector index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_vector_path")]
    pub path: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default)]
    pub embedder: EmbedderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector width; required for the hashing embedder, optional for OpenAI
    #[serde(default)]
    pub dimensions: Option<usize>,

    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Filled from `OPENAI_API_KEY` when not set in the file
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_vector_path(),
            collection: default_collection(),
            embedder: EmbedderKind::Hashing,
            model: default_embedding_model(),
            dimensions: None,
            api_base: default_api_base(),
            api_key: None,
        }
    }
}

fn default_vector_path() -> String {
    "vectors.db".to_string()
}

fn default_collection() -> String {
    "crawled_pages".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
