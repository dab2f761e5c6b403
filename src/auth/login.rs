use crate::auth::LoginError;
use crate::config::AuthConfig;
use crate::crawler::{find_hidden_token, HttpSession};
use crate::url::origin_of;
use crate::ConfigError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

/// Statuses a login POST may finish with and still count as accepted
const ACCEPTED_LOGIN_STATUSES: &[u16] = &[200, 302, 303];

/// A username/password login form and how to submit it
#[derive(Debug, Clone)]
pub struct LoginForm {
    login_url: Url,
    username: String,
    password: String,
    username_field: String,
    password_field: String,
    token_fields: Vec<String>,
}

impl LoginForm {
    /// Builds the form from `auto_cookies` settings
    ///
    /// # Returns
    ///
    /// * `Ok(LoginForm)` - All required fields are present
    /// * `Err(ConfigError)` - Login URL or credentials are missing or unusable
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let missing =
            |field: &str| ConfigError::Validation(format!("auto_cookies login requires '{}'", field));

        let login_url = config.login_url.as_deref().ok_or_else(|| missing("login-url"))?;
        let login_url = Url::parse(login_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid login-url: {}", e)))?;

        Ok(Self {
            login_url,
            username: config.username.clone().ok_or_else(|| missing("username"))?,
            password: config.password.clone().ok_or_else(|| missing("password"))?,
            username_field: config.username_field.clone(),
            password_field: config.password_field.clone(),
            token_fields: config.csrf_fields.clone(),
        })
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Logs in through `session`
    ///
    /// # Login Flow
    ///
    /// 1. GET the login page (also establishes any pre-login session cookie)
    /// 2. Scrape the first anti-forgery token found among the configured field names
    /// 3. POST credentials plus token as a urlencoded form, with `Referer` set
    ///    to the login URL and `Origin` to its origin
    /// 4. Accept when the POST ends in 200, 302 or 303 **and** the session now
    ///    holds at least one cookie for the login URL
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of cookies held for the login URL afterwards
    /// * `Err(LoginError)` - Any step failed
    pub async fn submit(
        &self,
        session: &dyn HttpSession,
        timeout: Duration,
    ) -> Result<usize, LoginError> {
        tracing::info!("Logging in to {}", self.login_url);

        let login_page = session
            .get(&self.login_url, timeout)
            .await
            .map_err(|e| LoginError::Transport(e.to_string()))?;

        let token = find_hidden_token(&login_page.body, &self.token_fields);
        match &token {
            Some((field, _)) => tracing::debug!("Found anti-forgery token in '{}'", field),
            None => tracing::debug!("No anti-forgery token on login page"),
        }

        let mut form = vec![
            (self.username_field.clone(), self.username.clone()),
            (self.password_field.clone(), self.password.clone()),
        ];
        form.extend(token);

        let response = session
            .post_form(&self.login_url, &form, self.form_headers(), timeout)
            .await
            .map_err(|e| LoginError::Transport(e.to_string()))?;

        if !ACCEPTED_LOGIN_STATUSES.contains(&response.status) {
            let preview: String = response.body.chars().take(200).collect();
            tracing::debug!("Login response preview: {}", preview);
            return Err(LoginError::Rejected {
                status: response.status,
            });
        }

        let cookies = session.cookies(&self.login_url);
        if cookies.is_empty() {
            return Err(LoginError::NoCookies {
                status: response.status,
            });
        }

        let names: Vec<&str> = cookies.iter().map(|(name, _)| name.as_str()).collect();
        tracing::debug!("Session cookies after login: {}", names.join(", "));

        Ok(cookies.len())
    }

    fn form_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        if let Ok(referer) = HeaderValue::from_str(self.login_url.as_str()) {
            headers.insert(header::REFERER, referer);
        }
        if let Some(origin) = origin_of(&self.login_url) {
            if let Ok(origin) = HeaderValue::from_str(&origin) {
                headers.insert(header::ORIGIN, origin);
            }
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthMode;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            mode: AuthMode::AutoCookies,
            username: Some("alice".to_string()),
            password: Some("secret".to_string()),
            login_url: Some("https://wiki.example.com:8443/login.action".to_string()),
            username_field: "os_username".to_string(),
            password_field: "os_password".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_from_config() {
        let form = LoginForm::from_config(&auth_config()).unwrap();
        assert_eq!(
            form.login_url().as_str(),
            "https://wiki.example.com:8443/login.action"
        );
        assert_eq!(form.token_fields[0], "atl_token");
    }

    #[test]
    fn test_from_config_missing_password() {
        let mut config = auth_config();
        config.password = None;
        let err = LoginForm::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_form_headers() {
        let form = LoginForm::from_config(&auth_config()).unwrap();
        let headers = form.form_headers();

        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            headers.get(header::REFERER).unwrap(),
            "https://wiki.example.com:8443/login.action"
        );
        assert_eq!(
            headers.get(header::ORIGIN).unwrap(),
            "https://wiki.example.com:8443"
        );
    }
}
