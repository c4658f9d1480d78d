//! Results of completed transfers.

use std::path::PathBuf;

use bytes::Bytes;
use serde::Serialize;

/// Result of a single-shot upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutput {
    /// Final object key.
    pub key: String,
    /// Bytes uploaded.
    pub size: u64,
    /// Entity tag reported by the store.
    pub e_tag: Option<String>,
    /// Version reported by the store.
    pub version: Option<String>,
    /// Public URL of the object.
    pub url: String,
}

/// Result of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultipartOutput {
    /// Final object key.
    pub key: String,
    /// Bytes uploaded.
    pub size: u64,
    /// Number of parts committed.
    pub parts: usize,
    /// Whether the upload continued from a checkpoint.
    pub resumed: bool,
    /// Entity tag reported by the store.
    pub e_tag: Option<String>,
    /// Version reported by the store.
    pub version: Option<String>,
    /// Public URL of the object.
    pub url: String,
}

/// Where downloaded bytes ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadTarget {
    /// Written to a local file.
    File {
        /// Destination path.
        path: PathBuf,
    },
    /// Kept in memory.
    Memory {
        /// Downloaded bytes.
        #[serde(skip)]
        data: Bytes,
    },
}

/// Result of a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutput {
    /// Object key.
    pub key: String,
    /// Bytes downloaded.
    pub size: u64,
    /// Entity tag reported by the store.
    pub e_tag: Option<String>,
    /// Content type reported by the store.
    pub content_type: Option<String>,
    /// Public URL of the object.
    pub url: String,
    /// Destination of the bytes.
    pub target: DownloadTarget,
}

impl DownloadOutput {
    /// Downloaded bytes, when kept in memory.
    pub fn data(&self) -> Option<&Bytes> {
        match &self.target {
            DownloadTarget::Memory { data } => Some(data),
            DownloadTarget::File { .. } => None,
        }
    }
}
