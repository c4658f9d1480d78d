//! Reqwest client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use super::SessionContext;
use crate::error::{Error, Result};

/// Default timeout for HTTP requests: 10 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Envelope codes treated as success when none are configured.
pub const DEFAULT_SUCCESS_CODES: [i64; 2] = [0, 200];

/// Configuration for the request gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// API origin prepended to base API paths
    #[cfg_attr(
        feature = "config",
        arg(long = "api-url", env = "MITA_API_URL", default_value = "")
    )]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "10")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Envelope codes that mark a successful response
    #[cfg_attr(
        feature = "config",
        arg(
            long = "success-code",
            env = "MITA_SUCCESS_CODES",
            value_delimiter = ',',
            default_values_t = DEFAULT_SUCCESS_CODES
        )
    )]
    #[serde(default = "default_success_codes")]
    pub success_codes: Vec<i64>,

    /// Session values injected into every request.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub session: SessionContext,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_success_codes() -> Vec<i64> {
    DEFAULT_SUCCESS_CODES.to_vec()
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
            success_codes: default_success_codes(),
            session: SessionContext::default(),
        }
    }
}

impl ReqwestConfig {
    /// Create a new configuration for the given API origin.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("mita/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Whether an envelope `code` counts as success.
    pub fn is_success_code(&self, code: i64) -> bool {
        if self.success_codes.is_empty() {
            DEFAULT_SUCCESS_CODES.contains(&code)
        } else {
            self.success_codes.contains(&code)
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.api_url.is_empty()
            && !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "api_url must be an http(s) origin, got `{}`",
                self.api_url
            )));
        }
        Ok(())
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the accepted envelope success codes.
    #[must_use]
    pub fn with_success_codes(mut self, codes: impl IntoIterator<Item = i64>) -> Self {
        self.success_codes = codes.into_iter().collect();
        self
    }

    /// Set the session values.
    #[must_use]
    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }
}
