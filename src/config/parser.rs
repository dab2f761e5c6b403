use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the login user name
pub const ENV_AUTH_USERNAME: &str = "SITEWALK_AUTH_USERNAME";
/// Environment variable holding the login password
pub const ENV_AUTH_PASSWORD: &str = "SITEWALK_AUTH_PASSWORD";
/// Environment variable holding the bearer token for `headers` mode
pub const ENV_AUTH_BEARER_TOKEN: &str = "SITEWALK_AUTH_BEARER_TOKEN";
/// Environment variable holding the OpenAI API key
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// Secrets found in the process environment override the file (see
/// [`apply_env_overrides`]) before validation runs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate(&config)?;

    Ok(config)
}

/// Parses and validates configuration from a TOML string, ignoring the environment
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Fills credential fields from environment variables
///
/// Non-empty values win over what the file says, so a checked-in config can
/// carry everything except the secrets.
///
/// # Arguments
///
/// * `config` - Configuration to update in place
/// * `lookup` - Variable lookup, normally `std::env::var`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(username) = read(ENV_AUTH_USERNAME) {
        config.auth.username = Some(username);
    }
    if let Some(password) = read(ENV_AUTH_PASSWORD) {
        config.auth.password = Some(password);
    }
    if let Some(token) = read(ENV_AUTH_BEARER_TOKEN) {
        config.auth.bearer_token = Some(token);
    }
    if config.vector_store.api_key.is_none() {
        config.vector_store.api_key = read(ENV_OPENAI_API_KEY);
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be matched to the exact config they used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
