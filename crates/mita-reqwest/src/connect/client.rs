//! Reqwest-based gateway client.

use std::sync::Arc;

use reqwest::Client;

use super::{ReqwestConfig, SessionContext};
use crate::error::{Error, Result};

/// Tracing target for gateway client operations.
pub const TRACING_TARGET: &str = "mita_reqwest::client";

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
}

/// Reqwest-based gateway to the backend API.
///
/// The client is cheap to clone; all clones share the same connection pool
/// and configuration. Requests are issued through [`call`](Self::call) and
/// [`call_direct`](Self::call_direct).
///
/// # Examples
///
/// ```rust,ignore
/// use mita_reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::new("https://api.example.com/api"))?;
/// let token: serde_json::Value = client.call("GET", "/oss/sts", None, None).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new gateway client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        config.validate()?;

        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            api_url = %config.api_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(Error::Transport)?;

        let inner = ReqwestClientInner { http, config };
        let client = Self {
            inner: Arc::new(inner),
        };

        tracing::info!(
            target: TRACING_TARGET,
            "Reqwest client created successfully"
        );

        Ok(client)
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Gets the session values attached to every request.
    pub fn session(&self) -> &SessionContext {
        &self.inner.config.session
    }

    /// Resolves a base API path against the configured origin.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.inner.config.api_url, path)
    }
}
