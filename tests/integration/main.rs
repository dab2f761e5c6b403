//! Integration tests for Sitewalk
//!
//! These tests drive the real HTTP stack against wiremock servers.

mod auth_tests;
mod crawl_tests;

use sitewalk::config::{parse_config, Config};

/// Builds a validated config crawling `seed` with no delay
///
/// `extra` is appended verbatim, so callers can add `[auth]` or override keys
/// in later tables.
pub fn test_config(seed: &str, crawler_extra: &str, extra: &str) -> Config {
    let toml = format!(
        r#"
[crawler]
seed-url = "{seed}"
delay-seconds = 0.0
request-timeout-seconds = 5
{crawler_extra}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
results-path = "results.json"

{extra}
"#
    );
    parse_config(&toml).expect("test config should be valid")
}
