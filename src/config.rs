//! Client configuration
//!
//! Values come from the builder or from the environment. `from_env` loads a
//! `.env` file first when one is present.

use crate::error::{ClientError, Result};
use std::fmt;
use std::time::Duration;

pub const ENV_API_URL: &str = "RECRUIT_API_URL";
pub const ENV_API_TOKEN: &str = "RECRUIT_API_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "RECRUIT_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "RECRUIT_MAX_RETRIES";

/// Connection settings for the remote API
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.example.com/api`
    pub base_url: String,

    /// Bearer token; `None` for anonymous reads
    pub token: Option<String>,

    /// Per-request timeout enforced by the HTTP client
    pub request_timeout: Duration,

    /// Retries for idempotent reads on transport or 5xx failures
    pub max_retries: u32,

    /// Base delay between retries
    pub retry_delay: Duration,

    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_millis(300),
            user_agent: format!("recruit-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// Keeps the token out of logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Read the configuration from `RECRUIT_*` environment variables
    ///
    /// Unset variables fall back to defaults; set but unparsable values are
    /// an error.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ClientConfig::builder();

        if let Some(url) = lookup(ENV_API_URL) {
            builder = builder.base_url(url);
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|t| !t.trim().is_empty()) {
            builder = builder.token(token);
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = lookup(ENV_MAX_RETRIES) {
            let retries: u32 = retries.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a non-negative integer", ENV_MAX_RETRIES))
            })?;
            builder = builder.max_retries(retries);
        }

        let config = builder.build();
        config.validate().map_err(ClientError::Config)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("base_url must be an http(s) URL, got `{}`", self.base_url));
        }

        if self.request_timeout.is_zero() {
            return Err("request_timeout must be greater than 0".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }

        Ok(())
    }

    /// Join an API path onto the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Builder for client configuration
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    token: Option<String>,
    request_timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_delay: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the client configuration
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();

        ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            token: self.token.or(defaults.token),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_retries, 2);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com/api/")
            .token("secret")
            .max_retries(0)
            .build();

        assert_eq!(config.max_retries, 0);
        assert_eq!(config.url_for("/jobs/stats"), "https://api.example.com/api/jobs/stats");
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::builder().token("secret-token").build();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://recruit.test/api"),
            (ENV_API_TOKEN, "abc"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_MAX_RETRIES, "4"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://recruit.test/api");
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 4);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "ftp://nope")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_API_TOKEN, "  ")])).unwrap();
        assert!(config.token.is_none());
    }
}
