//! Upload, multipart upload and download of objects.
//!
//! [`ObjectTransfer`] is the entry point: every operation validates its
//! request, connects a fresh [`TransferClient`](crate::client::TransferClient)
//! and returns a typed result. Validation failures never reach the network.

use std::sync::Arc;

use mita_reqwest::ReqwestClient;

use crate::client::{Connect, ConnectOptions, OssConnector, TransferClient};
use crate::config::ObjectConfig;
use crate::credentials::GatewayCredentialSource;
use crate::error::{Result, ValidationError};

mod checkpoint;
mod download;
mod limit;
mod multipart;
mod output;
mod payload;
mod request;
mod upload;

pub use checkpoint::{Checkpoint, CheckpointStore, CompletedPart, part_digest};
pub use limit::{MAX_TRAFFIC_LIMIT_BITS, MIN_TRAFFIC_LIMIT_BITS, TRAFFIC_LIMIT_HEADER, TrafficLimit};
pub use multipart::{DEFAULT_PARALLELISM, DEFAULT_PART_SIZE, MultipartOptions, plan_parts};
pub use output::{DownloadOutput, DownloadTarget, MultipartOutput, UploadOutput};
pub use payload::Payload;
pub use request::{
    DownloadRequest, MultipartUploadRequest, ProgressFn, TransferProgress, UploadRequest,
};

/// Tracing target for transfer operations.
pub const TRACING_TARGET: &str = "mita_object::transfer";

/// Runs transfers against the storage service.
///
/// # Examples
///
/// ```rust,ignore
/// use mita_object::ObjectConfig;
/// use mita_object::transfer::{ObjectTransfer, UploadRequest};
///
/// let transfer = ObjectTransfer::from_gateway(gateway, ObjectConfig::default())?;
/// let output = transfer
///     .upload(UploadRequest::new("avatar.png").with_payload(bytes))
///     .await?;
/// println!("{}", output.url);
/// ```
#[derive(Clone)]
pub struct ObjectTransfer {
    connector: Arc<dyn Connect>,
    config: ObjectConfig,
    checkpoints: CheckpointStore,
}

impl std::fmt::Debug for ObjectTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectTransfer")
            .field("config", &self.config)
            .field("checkpoints", &self.checkpoints)
            .finish_non_exhaustive()
    }
}

impl ObjectTransfer {
    /// Creates a transfer helper connecting through `connector`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(connector: impl Connect, config: ObjectConfig) -> Result<Self> {
        config.validate()?;
        let checkpoints = CheckpointStore::new(config.effective_checkpoint_dir());

        Ok(Self {
            connector: Arc::new(connector),
            config,
            checkpoints,
        })
    }

    /// Creates a transfer helper fetching credentials through the gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_gateway(gateway: ReqwestClient, config: ObjectConfig) -> Result<Self> {
        let source = GatewayCredentialSource::new(gateway, config.credential_path.clone());
        let connector = OssConnector::new(Arc::new(source), config.clone());
        Self::new(connector, config)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    /// Returns the checkpoint store used by multipart uploads.
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Uploads one object in a single request.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`](crate::Error::Validation) before any
    /// network activity, with [`Error::Credential`](crate::Error::Credential)
    /// when no client could be built, and with the store error otherwise.
    #[tracing::instrument(name = "object.upload", skip_all, fields(name = %request.name))]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutput> {
        request.validate()?;
        let payload = request
            .payload
            .as_ref()
            .ok_or(ValidationError::MissingPayload)?;

        let client = self.connect(&request.connect_options()).await?;
        let key = client
            .location()
            .resolve_key(&request.name, self.config.catalogue_prefix);

        let result = client.put_object(&key, payload).await;
        log_outcome("upload", &key, &result);
        result
    }

    /// Uploads one object in parts, resuming from a checkpoint when possible.
    ///
    /// # Errors
    ///
    /// Same as [`upload`](Self::upload); a failed part leaves the checkpoint
    /// in place for the next attempt.
    #[tracing::instrument(name = "object.multipart_upload", skip_all, fields(name = %request.upload.name))]
    pub async fn multipart_upload(&self, request: MultipartUploadRequest) -> Result<MultipartOutput> {
        request.validate()?;
        let payload = request
            .upload
            .payload
            .as_ref()
            .ok_or(ValidationError::MissingPayload)?;

        let client = self.connect(&request.connect_options()).await?;
        let key = client
            .location()
            .resolve_key(&request.upload.name, self.config.catalogue_prefix);

        let options = MultipartOptions {
            part_size: request.part_size.unwrap_or(self.config.part_size),
            parallelism: self.config.effective_parallelism(),
            checkpoints: &self.checkpoints,
            progress: request.progress.as_deref(),
        };

        let result = client.put_multipart(&key, payload, options).await;
        log_outcome("multipart upload", &key, &result);
        result
    }

    /// Downloads one object to a file or into memory.
    ///
    /// # Errors
    ///
    /// Same as [`upload`](Self::upload).
    #[tracing::instrument(name = "object.download", skip_all, fields(key = %request.key))]
    pub async fn download(&self, request: DownloadRequest) -> Result<DownloadOutput> {
        request.validate()?;

        let client = self.connect(&request.connect_options()).await?;
        let result = client
            .get_object(&request.key, request.local_path.as_deref())
            .await;
        log_outcome("download", &request.key, &result);
        result
    }

    async fn connect(&self, options: &ConnectOptions) -> Result<TransferClient> {
        if let Some(limit) = options.traffic_limit
            && !limit.is_within_service_range()
        {
            tracing::warn!(
                target: TRACING_TARGET,
                bits_per_second = limit.bits_per_second(),
                min = MIN_TRAFFIC_LIMIT_BITS,
                max = MAX_TRAFFIC_LIMIT_BITS,
                "Traffic limit outside the range honoured by the service"
            );
        }

        self.connector.connect(options).await.inspect_err(|err| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "Failed to create object store client"
            );
        })
    }
}

fn log_outcome<T>(operation: &str, key: &str, result: &Result<T>) {
    match result {
        Ok(_) => tracing::info!(
            target: TRACING_TARGET,
            operation,
            key,
            "Transfer completed"
        ),
        Err(err) => tracing::error!(
            target: TRACING_TARGET,
            operation,
            key,
            error = %err,
            kind = %err.kind(),
            "Transfer failed"
        ),
    }
}
