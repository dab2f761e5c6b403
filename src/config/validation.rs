use crate::config::types::{
    AuthConfig, AuthMode, Config, CrawlerConfig, EmbedderKind, OutputConfig, UserAgentConfig,
    VectorStoreConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent fetch workers
const MAX_WORKERS: usize = 32;

/// Upper bound on the base delay between requests, in seconds
pub const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Upper bound on the per-request deadline, in seconds
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 3600;

/// Validates the entire configuration
///
/// Any error here is fatal: the crawl must not start with an unusable seed or
/// half-specified credentials.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_auth_config(&config.auth)?;
    validate_output_config(&config.output)?;
    validate_vector_store_config(&config.vector_store)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("seed-url", &config.seed_url)?;

    if let Some(max_pages) = config.max_pages {
        if max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "max-pages must be >= 1 when set, got {}",
                max_pages
            )));
        }
    }

    if !config.delay_seconds.is_finite()
        || config.delay_seconds < 0.0
        || config.delay_seconds > MAX_DELAY_SECONDS
    {
        return Err(ConfigError::Validation(format!(
            "delay-seconds must be between 0 and {}, got {}",
            MAX_DELAY_SECONDS, config.delay_seconds
        )));
    }

    if config.request_timeout_seconds < 1
        || config.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS
    {
        return Err(ConfigError::Validation(format!(
            "request-timeout-seconds must be between 1 and {}, got {}",
            MAX_REQUEST_TIMEOUT_SECONDS, config.request_timeout_seconds
        )));
    }

    if config.preview_length < 1 {
        return Err(ConfigError::Validation(
            "preview-length must be >= 1".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates that the fields the selected auth mode needs are present
fn validate_auth_config(config: &AuthConfig) -> Result<(), ConfigError> {
    let mode = config.mode.as_str();

    match config.mode {
        AuthMode::None => {}
        AuthMode::Basic => {
            require(mode, "username", &config.username)?;
            require(mode, "password", &config.password)?;
        }
        AuthMode::Cookies => {
            if config.cookies.is_empty() {
                return Err(ConfigError::Validation(
                    "auth mode 'cookies' requires at least one entry in auth.cookies".to_string(),
                ));
            }
        }
        AuthMode::Headers => {
            require(mode, "bearer-token", &config.bearer_token)?;
        }
        AuthMode::AutoCookies => {
            require(mode, "username", &config.username)?;
            require(mode, "password", &config.password)?;
            let login_url = require(mode, "login-url", &config.login_url)?;
            validate_http_url("login-url", login_url)?;

            if config.username_field.trim().is_empty() || config.password_field.trim().is_empty()
            {
                return Err(ConfigError::Validation(
                    "username-field and password-field cannot be empty".to_string(),
                ));
            }
        }
    }

    for status in &config.expiry.statuses {
        if !(100..=599).contains(status) {
            return Err(ConfigError::Validation(format!(
                "auth.expiry.statuses contains an invalid HTTP status: {}",
                status
            )));
        }
    }

    if config.expiry.login_keywords.iter().any(|k| k.is_empty()) {
        return Err(ConfigError::Validation(
            "auth.expiry.login-keywords cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.database_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "database-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates vector index configuration (only when enabled)
fn validate_vector_store_config(config: &VectorStoreConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.path.is_empty() || config.collection.is_empty() {
        return Err(ConfigError::Validation(
            "vector-store path and collection cannot be empty".to_string(),
        ));
    }

    if let Some(dimensions) = config.dimensions {
        if dimensions < 8 {
            return Err(ConfigError::Validation(format!(
                "vector-store dimensions must be >= 8, got {}",
                dimensions
            )));
        }
    }

    if config.embedder == EmbedderKind::Openai {
        if config.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "vector-store model cannot be empty".to_string(),
            ));
        }
        Url::parse(&config.api_base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-base: {}", e)))?;
    }

    Ok(())
}

/// Returns the value of a required auth field or a validation error naming it
fn require<'a>(
    mode: &str,
    field: &str,
    value: &'a Option<String>,
) -> Result<&'a str, ConfigError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Validation(format!(
            "auth mode '{}' requires '{}'",
            mode, field
        ))),
    }
}

/// Checks that a URL parses, uses http(s), and names a host
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use the http or https scheme",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must include a host",
            field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid contact-email: '{}'",
            email
        )));
    }

    Ok(())
}
