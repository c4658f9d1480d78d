use async_trait::async_trait;
use mita_reqwest::ReqwestClient;

use super::{StsCredentials, TRACING_TARGET};
use crate::error::{Error, Result};

/// Produces STS credential bundles.
#[async_trait]
pub trait CredentialSource: Send + Sync + 'static {
    /// Fetches a fresh bundle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] when no bundle could be obtained.
    async fn fetch(&self) -> Result<StsCredentials>;
}

/// Fetches bundles from the backend credential endpoint through the gateway.
#[derive(Debug, Clone)]
pub struct GatewayCredentialSource {
    client: ReqwestClient,
    path: String,
}

impl GatewayCredentialSource {
    /// Creates a source calling `path` on the gateway's API origin.
    pub fn new(client: ReqwestClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    /// Returns the credential endpoint path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl CredentialSource for GatewayCredentialSource {
    async fn fetch(&self) -> Result<StsCredentials> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %self.path,
            "Fetching sts credentials"
        );

        let envelope = self
            .client
            .call_envelope::<StsCredentials>("GET", &self.path, None, None)
            .await
            .map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET,
                    path = %self.path,
                    error = %err,
                    "Failed to fetch sts credentials"
                );
                Error::credential_from("failed to fetch sts credentials", err)
            })?;

        let bundle = envelope
            .data
            .ok_or_else(|| Error::credential("credential response carried no bundle"))?;

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bundle.bucket,
            region = %bundle.region,
            expiration = bundle.expiration,
            "Fetched sts credentials"
        );

        Ok(bundle)
    }
}
