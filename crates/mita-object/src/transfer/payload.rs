//! Upload payloads.

use std::ops::Range;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use crate::error::Result;

/// Data selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// In-memory bytes.
    Bytes(Bytes),
    /// A local file read on demand.
    File(PathBuf),
}

impl Payload {
    /// Total size in bytes.
    pub async fn size(&self) -> Result<u64> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.len() as u64),
            Self::File(path) => Ok(tokio::fs::metadata(path).await?.len()),
        }
    }

    /// Reads the whole payload.
    pub async fn read_all(&self) -> Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::File(path) => Ok(tokio::fs::read(path).await?.into()),
        }
    }

    /// Reads the bytes in `range`.
    pub async fn read_range(&self, range: Range<u64>) -> Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.slice(range.start as usize..range.end as usize)),
            Self::File(path) => {
                let mut file = tokio::fs::File::open(path).await?;
                file.seek(SeekFrom::Start(range.start)).await?;
                let mut buf = vec![0; (range.end - range.start) as usize];
                file.read_exact(&mut buf).await?;
                Ok(buf.into())
            }
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(bytes) => format!("{} bytes in memory", bytes.len()),
            Self::File(path) => path.display().to_string(),
        }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<PathBuf> for Payload {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bytes_payload() {
        let payload = Payload::from(b"hello world".to_vec());
        assert_eq!(payload.size().await.unwrap(), 11);
        assert_eq!(payload.read_range(6..11).await.unwrap(), "world");
    }

    #[tokio::test]
    async fn test_file_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        tokio::fs::write(&path, b"0123456789").await.unwrap();

        let payload = Payload::from(path);
        assert_eq!(payload.size().await.unwrap(), 10);
        assert_eq!(payload.read_range(3..7).await.unwrap(), "3456");
        assert_eq!(payload.read_all().await.unwrap(), "0123456789");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let payload = Payload::File(PathBuf::from("/nonexistent/mita/file"));
        assert!(matches!(
            payload.size().await.unwrap_err(),
            crate::Error::Io(_)
        ));
    }
}
