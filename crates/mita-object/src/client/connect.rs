use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use object_store::ClientOptions;
use object_store::aws::AmazonS3Builder;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{BucketLocation, TRACING_TARGET, TransferClient};
use crate::config::ObjectConfig;
use crate::credentials::{CredentialSource, StsCredentialProvider};
use crate::error::{Error, Result};
use crate::transfer::{TRAFFIC_LIMIT_HEADER, TrafficLimit};

/// Per-call options applied to a freshly built client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Bandwidth limit sent with every request.
    pub traffic_limit: Option<TrafficLimit>,
    /// Timeout of each request issued by the client.
    pub timeout: Option<Duration>,
}

impl ConnectOptions {
    /// Set the traffic limit.
    #[must_use]
    pub fn with_traffic_limit(mut self, limit: Option<TrafficLimit>) -> Self {
        self.traffic_limit = limit;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Default headers carried by every request of the client.
    pub fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(limit) = self.traffic_limit {
            headers.insert(
                HeaderName::from_static(TRAFFIC_LIMIT_HEADER),
                HeaderValue::from(limit.bits_per_second()),
            );
        }
        headers
    }

    /// Converts the options into object store client options.
    pub fn client_options(&self) -> ClientOptions {
        let options = ClientOptions::new().with_default_headers(self.default_headers());
        match self.timeout {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}

/// Builds a [`TransferClient`] for one transfer.
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    /// Produces an active client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] when no credential bundle could be
    /// obtained; nothing else is attempted in that case.
    async fn connect(&self, options: &ConnectOptions) -> Result<TransferClient>;
}

/// Connects to the storage service with STS credentials.
#[derive(Clone)]
pub struct OssConnector {
    source: Arc<dyn CredentialSource>,
    config: ObjectConfig,
}

impl std::fmt::Debug for OssConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OssConnector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OssConnector {
    /// Creates a connector fetching bundles from `source`.
    pub fn new(source: Arc<dyn CredentialSource>, config: ObjectConfig) -> Self {
        Self { source, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }
}

#[async_trait]
impl Connect for OssConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<TransferClient> {
        let bundle = self.source.fetch().await?;

        let interval = self.config.refresh_interval_for(&bundle);
        let region = bundle.normalized_region().to_owned();
        let endpoint = self.config.endpoint_for(&bundle.bucket, &region);
        let provider = StsCredentialProvider::new(self.source.clone(), &bundle, interval);

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bundle.bucket,
            region = %region,
            endpoint = %endpoint,
            refresh_secs = interval.as_secs(),
            traffic_limit = options.traffic_limit.map(|l| l.bits_per_second()),
            "Building object store client"
        );

        let store = AmazonS3Builder::new()
            .with_bucket_name(&bundle.bucket)
            .with_region(&region)
            .with_endpoint(&endpoint)
            .with_virtual_hosted_style_request(true)
            .with_allow_http(endpoint.starts_with("http://"))
            .with_credentials(Arc::new(provider))
            .with_client_options(options.client_options())
            .build()
            .map_err(|err| Error::Config(format!("failed to build object store client: {err}")))?;

        let location = BucketLocation::new(&bundle.bucket, region, endpoint)
            .with_catalogue(bundle.catalogue().map(str::to_owned));

        Ok(TransferClient::new(store, location))
    }
}
