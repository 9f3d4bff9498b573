//! Immutable per-client configuration.
//!
//! Credentials are part of the configuration. Changing them produces a new
//! [`ClientConfig`] (see [`crate::ApiClient::with_credentials`]) instead of
//! mutating shared headers in place.

use std::time::Duration;

use bookline_core::AppConfig;
use reqwest::Url;

use crate::endpoint::TimeoutClass;
use crate::error::ApiError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const SLOW_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_USER_AGENT: &str = "bookline/0.1 (checkout)";

#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    bearer_token: Option<String>,
    pub default_timeout: Duration,
    pub slow_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Configuration with default timeouts and no credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UrlError`] if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // Exactly one trailing slash so relative joins append to the path.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| ApiError::UrlError(format!("invalid base URL '{base_url}': {e}")))?;
        Ok(Self {
            base_url,
            bearer_token: None,
            default_timeout: DEFAULT_TIMEOUT,
            slow_timeout: SLOW_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            bearer_token: config.api_token.clone(),
            default_timeout: Duration::from_secs(config.request_timeout_secs),
            slow_timeout: Duration::from_secs(config.slow_request_timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, default_timeout: Duration, slow_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self.slow_timeout = slow_timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    #[must_use]
    pub fn timeout_for(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Default => self.default_timeout,
            TimeoutClass::Slow => self.slow_timeout,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field("default_timeout", &self.default_timeout)
            .field("slow_timeout", &self.slow_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
