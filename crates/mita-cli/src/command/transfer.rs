use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use mita_object::transfer::{
    DownloadRequest, MultipartUploadRequest, ObjectTransfer, TransferProgress, UploadRequest,
};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::TRACING_TARGET_TRANSFER;

/// Bandwidth and timeout options shared by all transfers.
#[derive(Debug, Clone, Default, Args)]
pub struct TransferLimits {
    /// Bandwidth limit in KB/s
    #[arg(long = "speed-limit", value_name = "KBPS")]
    pub speed_limit_kbps: Option<u64>,

    /// Per-request timeout in milliseconds
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl TransferLimits {
    fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Arguments of `mita upload`.
#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Object name
    pub name: String,

    /// Local file to upload
    pub file: PathBuf,

    #[command(flatten)]
    pub limits: TransferLimits,
}

impl UploadArgs {
    /// Builds the upload request.
    pub fn into_request(self) -> UploadRequest {
        let mut request = UploadRequest::new(self.name).with_payload(self.file);
        request.speed_limit_kbps = self.limits.speed_limit_kbps;
        request.timeout = self.limits.timeout();
        request
    }

    /// Runs the upload.
    pub async fn run(self, transfer: &ObjectTransfer) -> anyhow::Result<Value> {
        let output = transfer
            .upload(self.into_request())
            .await
            .map_err(mita_core::Error::from)
            .context("upload failed")?;
        Ok(serde_json::to_value(output)?)
    }
}

/// Arguments of `mita multipart-upload`.
#[derive(Debug, Clone, Args)]
pub struct MultipartUploadArgs {
    /// Object name
    pub name: String,

    /// Local file to upload
    pub file: PathBuf,

    /// Part size in bytes (defaults to --oss-part-size)
    #[arg(long, value_name = "BYTES")]
    pub part_size: Option<u64>,

    #[command(flatten)]
    pub limits: TransferLimits,
}

impl MultipartUploadArgs {
    /// Builds the multipart upload request, logging progress per part.
    pub fn into_request(self) -> MultipartUploadRequest {
        let mut request = MultipartUploadRequest::new(self.name)
            .with_payload(self.file)
            .with_progress(log_progress);
        request.upload.speed_limit_kbps = self.limits.speed_limit_kbps;
        request.upload.timeout = self.limits.timeout();
        request.part_size = self.part_size;
        request
    }

    /// Runs the multipart upload.
    pub async fn run(self, transfer: &ObjectTransfer) -> anyhow::Result<Value> {
        let output = transfer
            .multipart_upload(self.into_request())
            .await
            .map_err(mita_core::Error::from)
            .context("multipart upload failed")?;
        Ok(serde_json::to_value(output)?)
    }
}

fn log_progress(progress: &TransferProgress) {
    tracing::info!(
        target: TRACING_TARGET_TRANSFER,
        percent = progress.percent(),
        completed_parts = progress.completed_parts,
        total_parts = progress.total_parts,
        transferred_bytes = progress.transferred_bytes,
        "Upload progress"
    );
}

/// Arguments of `mita download`.
#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    /// Object key
    pub key: String,

    /// File to write; the object is written to stdout when omitted
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub limits: TransferLimits,
}

impl DownloadArgs {
    /// Builds the download request.
    pub fn into_request(self) -> DownloadRequest {
        let mut request = DownloadRequest::new(self.key);
        request.local_path = self.output;
        request.speed_limit_kbps = self.limits.speed_limit_kbps;
        request.timeout = self.limits.timeout();
        request
    }

    /// Runs the download.
    ///
    /// Returns the download summary when writing to a file; otherwise the
    /// object bytes are written to stdout and nothing else is printed.
    pub async fn run(self, transfer: &ObjectTransfer) -> anyhow::Result<Option<Value>> {
        let output = transfer
            .download(self.into_request())
            .await
            .map_err(mita_core::Error::from)
            .context("download failed")?;

        match output.data() {
            Some(data) => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(data).await.context("failed to write to stdout")?;
                stdout.flush().await?;
                Ok(None)
            }
            None => Ok(Some(serde_json::to_value(&output)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: crate::command::Command,
    }

    fn parse(args: &[&str]) -> crate::command::Command {
        let mut argv = vec!["mita"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_upload_limits_become_request_fields() {
        let crate::command::Command::Upload(args) = parse(&[
            "upload",
            "notes.txt",
            "./notes.txt",
            "--speed-limit",
            "200",
            "--timeout-ms",
            "1500",
        ]) else {
            panic!("expected upload");
        };

        let request = args.into_request();
        assert_eq!(request.name, "notes.txt");
        assert_eq!(request.speed_limit_kbps, Some(200));
        assert_eq!(request.timeout, Some(Duration::from_millis(1500)));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_non_numeric_speed_limit_is_rejected() {
        let result = Harness::try_parse_from(["mita", "upload", "a", "b", "--speed-limit", "fast"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_speed_limit_fails_validation() {
        let crate::command::Command::MultipartUpload(args) =
            parse(&["multipart-upload", "big.bin", "./big.bin", "--speed-limit", "0"])
        else {
            panic!("expected multipart upload");
        };

        let request = args.into_request();
        assert!(request.progress.is_some());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_download_output_path() {
        let crate::command::Command::Download(args) = parse(&["download", "a.txt", "-o", "out/a.txt"])
        else {
            panic!("expected download");
        };

        let request = args.into_request();
        assert_eq!(request.local_path.as_deref(), Some(Path::new("out/a.txt")));
    }
}
