use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use object_store::CredentialProvider;
use object_store::aws::AwsCredential;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CredentialSource, StsCredentials, TRACING_TARGET};
use crate::error::Result;

/// Store name reported on credential refresh failures.
const STORE_NAME: &str = "OSS";

struct CachedCredential {
    credential: Arc<AwsCredential>,
    fetched_at: Instant,
}

/// Credential provider that refreshes the STS bundle on a fixed interval.
///
/// The first bundle is handed in at construction; every signing request
/// after `interval` has elapsed triggers one fetch from the source, shared
/// by all concurrent requests.
pub struct StsCredentialProvider {
    source: Arc<dyn CredentialSource>,
    interval: Duration,
    cached: Mutex<CachedCredential>,
}

impl std::fmt::Debug for StsCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsCredentialProvider")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl StsCredentialProvider {
    /// Creates a provider seeded with `initial`.
    pub fn new(
        source: Arc<dyn CredentialSource>,
        initial: &StsCredentials,
        interval: Duration,
    ) -> Self {
        let cached = CachedCredential {
            credential: Arc::new(initial.to_aws_credential()),
            fetched_at: Instant::now(),
        };

        Self {
            source,
            interval,
            cached: Mutex::new(cached),
        }
    }

    /// Returns the refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current credential, refreshing it when stale.
    pub async fn current(&self) -> Result<Arc<AwsCredential>> {
        let mut cached = self.cached.lock().await;
        if cached.fetched_at.elapsed() < self.interval {
            return Ok(cached.credential.clone());
        }

        tracing::debug!(
            target: TRACING_TARGET,
            interval_secs = self.interval.as_secs(),
            "Refreshing sts credentials"
        );

        let bundle = self.source.fetch().await.inspect_err(|err| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "Failed to refresh sts credentials"
            );
        })?;

        cached.credential = Arc::new(bundle.to_aws_credential());
        cached.fetched_at = Instant::now();
        Ok(cached.credential.clone())
    }
}

#[async_trait]
impl CredentialProvider for StsCredentialProvider {
    type Credential = AwsCredential;

    async fn get_credential(&self) -> object_store::Result<Arc<AwsCredential>> {
        self.current()
            .await
            .map_err(|err| object_store::Error::Generic {
                store: STORE_NAME,
                source: Box::new(err),
            })
    }
}
