//! Transfer requests and their validation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{Payload, TrafficLimit};
use crate::client::{ConnectOptions, object_path};
use crate::error::ValidationError;

/// Callback invoked after every completed part of a multipart upload.
pub type ProgressFn = Arc<dyn Fn(&TransferProgress) + Send + Sync>;

/// Progress of a multipart upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferProgress {
    /// Parts uploaded so far, including parts restored from a checkpoint.
    pub completed_parts: usize,
    /// Number of parts in the plan.
    pub total_parts: usize,
    /// Bytes uploaded so far.
    pub transferred_bytes: u64,
    /// Total payload size.
    pub total_bytes: u64,
}

impl TransferProgress {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total_parts == 0 {
            return 1.0;
        }
        self.completed_parts as f64 / self.total_parts as f64
    }

    /// Completed percentage, rounded down.
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).floor() as u8
    }
}

fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    object_path(key).map(|_| ())
}

fn validate_limits(
    speed_limit_kbps: Option<u64>,
    timeout: Option<Duration>,
) -> Result<(), ValidationError> {
    if speed_limit_kbps == Some(0) {
        return Err(ValidationError::InvalidSpeedLimit);
    }
    if timeout.is_some_and(|t| t.is_zero()) {
        return Err(ValidationError::InvalidTimeout);
    }
    Ok(())
}

fn connect_options(speed_limit_kbps: Option<u64>, timeout: Option<Duration>) -> ConnectOptions {
    ConnectOptions::default()
        .with_traffic_limit(speed_limit_kbps.and_then(TrafficLimit::from_kbps))
        .with_timeout(timeout)
}

/// Single-shot upload of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Object name, prefixed with the catalogue when enabled.
    pub name: String,
    /// Data to upload.
    pub payload: Option<Payload>,
    /// Bandwidth limit in KB/s.
    pub speed_limit_kbps: Option<u64>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl UploadRequest {
    /// Creates a request for `name` without payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
            speed_limit_kbps: None,
            timeout: None,
        }
    }

    /// Set the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set the bandwidth limit in KB/s.
    #[must_use]
    pub fn with_speed_limit_kbps(mut self, kbps: u64) -> Self {
        self.speed_limit_kbps = Some(kbps);
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Checks the request without touching the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_key(&self.name)?;
        if self.payload.is_none() {
            return Err(ValidationError::MissingPayload);
        }
        validate_limits(self.speed_limit_kbps, self.timeout)
    }

    /// Client options derived from the limits.
    pub fn connect_options(&self) -> ConnectOptions {
        connect_options(self.speed_limit_kbps, self.timeout)
    }
}

/// Resumable multipart upload of one object.
#[derive(Clone)]
pub struct MultipartUploadRequest {
    /// Object name, payload and limits.
    pub upload: UploadRequest,
    /// Part size in bytes; the configured default when unset.
    pub part_size: Option<u64>,
    /// Called after every completed part.
    pub progress: Option<ProgressFn>,
}

impl std::fmt::Debug for MultipartUploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartUploadRequest")
            .field("upload", &self.upload)
            .field("part_size", &self.part_size)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl MultipartUploadRequest {
    /// Creates a request for `name` without payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            upload: UploadRequest::new(name),
            part_size: None,
            progress: None,
        }
    }

    /// Set the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.upload = self.upload.with_payload(payload);
        self
    }

    /// Set the bandwidth limit in KB/s.
    #[must_use]
    pub fn with_speed_limit_kbps(mut self, kbps: u64) -> Self {
        self.upload = self.upload.with_speed_limit_kbps(kbps);
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.upload = self.upload.with_timeout(timeout);
        self
    }

    /// Set the part size in bytes.
    #[must_use]
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&TransferProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Checks the request without touching the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.upload.validate()?;
        if self.part_size == Some(0) {
            return Err(ValidationError::InvalidPartSize);
        }
        Ok(())
    }

    /// Client options derived from the limits.
    pub fn connect_options(&self) -> ConnectOptions {
        self.upload.connect_options()
    }
}

/// Download of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Object key.
    pub key: String,
    /// File to write; the bytes are returned in memory when unset.
    pub local_path: Option<PathBuf>,
    /// Bandwidth limit in KB/s.
    pub speed_limit_kbps: Option<u64>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl DownloadRequest {
    /// Creates an in-memory download of `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            local_path: None,
            speed_limit_kbps: None,
            timeout: None,
        }
    }

    /// Write the object to `path`.
    #[must_use]
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Set the bandwidth limit in KB/s.
    #[must_use]
    pub fn with_speed_limit_kbps(mut self, kbps: u64) -> Self {
        self.speed_limit_kbps = Some(kbps);
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Checks the request without touching the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_key(&self.key)?;
        validate_limits(self.speed_limit_kbps, self.timeout)
    }

    /// Client options derived from the limits.
    pub fn connect_options(&self) -> ConnectOptions {
        connect_options(self.speed_limit_kbps, self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_validation() {
        assert_eq!(
            UploadRequest::new("").with_payload(vec![1]).validate(),
            Err(ValidationError::EmptyKey)
        );
        assert_eq!(
            UploadRequest::new("a.txt").validate(),
            Err(ValidationError::MissingPayload)
        );
        assert_eq!(
            UploadRequest::new("docs//a.txt").with_payload(vec![1]).validate(),
            Err(ValidationError::InvalidKey)
        );
        assert_eq!(
            UploadRequest::new("a.txt")
                .with_payload(vec![1])
                .with_speed_limit_kbps(0)
                .validate(),
            Err(ValidationError::InvalidSpeedLimit)
        );
        assert_eq!(
            UploadRequest::new("a.txt")
                .with_payload(vec![1])
                .with_timeout(Duration::ZERO)
                .validate(),
            Err(ValidationError::InvalidTimeout)
        );
        assert!(UploadRequest::new("a.txt").with_payload(vec![1]).validate().is_ok());
    }

    #[test]
    fn test_multipart_validation() {
        let request = MultipartUploadRequest::new("big.bin")
            .with_payload(vec![0; 16])
            .with_part_size(0);
        assert_eq!(request.validate(), Err(ValidationError::InvalidPartSize));
    }

    #[test]
    fn test_download_validation() {
        assert_eq!(
            DownloadRequest::new(" ").validate(),
            Err(ValidationError::EmptyKey)
        );
        assert!(DownloadRequest::new("a.txt").validate().is_ok());
        assert!(DownloadRequest::new("docs/report[1]#v2.pdf").validate().is_ok());
        assert_eq!(
            DownloadRequest::new("/docs/a.txt").validate(),
            Err(ValidationError::InvalidKey)
        );
    }

    #[test]
    fn test_connect_options_carry_bits() {
        let options = UploadRequest::new("a.txt")
            .with_speed_limit_kbps(200)
            .with_timeout(Duration::from_secs(30))
            .connect_options();
        assert_eq!(
            options.traffic_limit.map(|l| l.bits_per_second()),
            Some(200 * 1024 * 8)
        );
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));

        let options = DownloadRequest::new("a.txt").with_speed_limit_kbps(50).connect_options();
        assert_eq!(options.traffic_limit.map(|l| l.bits_per_second()), Some(409_600));
    }

    #[test]
    fn test_progress_percent() {
        let progress = TransferProgress {
            completed_parts: 2,
            total_parts: 3,
            transferred_bytes: 10,
            total_bytes: 12,
        };
        assert_eq!(progress.percent(), 66);
    }
}
