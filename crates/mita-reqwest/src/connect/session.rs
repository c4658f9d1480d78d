//! Session-scoped header values.

#[cfg(feature = "config")]
use clap::Args;
use reqwest::header::{ACCEPT_LANGUAGE, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Locale sent when no preference is stored.
pub const DEFAULT_LANGUAGE: &str = "cn";

/// Tenant identifier sent with every request.
pub const DEFAULT_TENANT_ID: &str = "1";

/// Name of the tenant header.
pub const TENANT_HEADER: &str = "tenant-id";

/// Values sourced once at session start and attached to every request.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct SessionContext {
    /// Bearer token of the signed-in user
    #[cfg_attr(
        feature = "config",
        arg(long = "session-token", env = "MITA_SESSION_TOKEN")
    )]
    #[serde(default)]
    pub token: Option<String>,

    /// Preferred locale sent as Accept-Language
    #[cfg_attr(
        feature = "config",
        arg(long = "language", env = "MITA_LANGUAGE", default_value = DEFAULT_LANGUAGE)
    )]
    #[serde(default = "default_language")]
    pub language: String,

    /// Tenant identifier header value
    #[cfg_attr(
        feature = "config",
        arg(long = "tenant-id", env = "MITA_TENANT_ID", default_value = DEFAULT_TENANT_ID)
    )]
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_owned()
}

fn default_tenant_id() -> String {
    DEFAULT_TENANT_ID.to_owned()
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            token: None,
            language: default_language(),
            tenant_id: default_tenant_id(),
        }
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("language", &self.language)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl SessionContext {
    /// Set the bearer token. An empty token is treated as absent.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Set the preferred locale.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the tenant identifier.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    /// Returns the locale, falling back to the default when empty.
    pub fn effective_language(&self) -> &str {
        if self.language.is_empty() {
            DEFAULT_LANGUAGE
        } else {
            &self.language
        }
    }

    /// Writes the session headers into `headers`, replacing existing values.
    pub(crate) fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::InvalidHeader(AUTHORIZATION.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let language = HeaderValue::from_str(self.effective_language())
            .map_err(|_| Error::InvalidHeader(ACCEPT_LANGUAGE.to_string()))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let tenant = HeaderValue::from_str(&self.tenant_id)
            .map_err(|_| Error::InvalidHeader(TENANT_HEADER.to_owned()))?;
        headers.insert(HeaderName::from_static(TENANT_HEADER), tenant);

        Ok(())
    }
}
