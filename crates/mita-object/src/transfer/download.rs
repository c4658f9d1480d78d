use std::path::{Path, PathBuf};

use futures::StreamExt;
use object_store::{Attribute, GetResult, ObjectStore};
use tokio::io::AsyncWriteExt;

use super::{DownloadOutput, DownloadTarget, TRACING_TARGET};
use crate::client::{TransferClient, object_path};
use crate::error::Result;

impl TransferClient {
    /// Downloads `key`, writing it to `local_path` or keeping it in memory.
    ///
    /// File downloads are streamed into a sibling `.part` file that is
    /// renamed onto `local_path` once complete.
    pub async fn get_object(&self, key: &str, local_path: Option<&Path>) -> Result<DownloadOutput> {
        tracing::debug!(
            target: TRACING_TARGET,
            key,
            local_path = local_path.map(|p| p.display().to_string()),
            "Downloading object"
        );

        let result = self.objects().get(&object_path(key)?).await?;
        let e_tag = result.meta.e_tag.clone();
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());

        let (size, target) = match local_path {
            Some(path) => {
                let written = write_file(result, path).await?;
                let target = DownloadTarget::File {
                    path: path.to_path_buf(),
                };
                (written, target)
            }
            None => {
                let data = result.bytes().await?;
                (data.len() as u64, DownloadTarget::Memory { data })
            }
        };

        Ok(DownloadOutput {
            key: key.to_owned(),
            size,
            e_tag,
            content_type,
            url: self.location().object_url(key),
            target,
        })
    }
}

async fn write_file(result: GetResult, path: &Path) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    match stream_into(result, &partial).await {
        Ok(written) => {
            tokio::fs::rename(&partial, path).await?;
            Ok(written)
        }
        Err(err) => {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::debug!(
                    target: TRACING_TARGET,
                    path = %partial.display(),
                    error = %cleanup,
                    "Could not remove partial download"
                );
            }
            Err(err)
        }
    }
}

async fn stream_into(result: GetResult, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = result.into_stream();
    let mut written = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use object_store::memory::InMemory;

    use super::*;
    use crate::client::BucketLocation;
    use crate::transfer::Payload;

    async fn client_with(key: &str, data: &[u8]) -> TransferClient {
        let location = BucketLocation::new("media", "oss-cn-hangzhou", "https://media.example.com");
        let client = TransferClient::new(InMemory::new(), location);
        client
            .put_object(key, &Payload::from(data.to_vec()))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_get_object_in_memory() {
        let client = client_with("a/b.txt", b"payload").await;

        let output = client.get_object("a/b.txt", None).await.unwrap();
        assert_eq!(output.size, 7);
        assert_eq!(output.data().unwrap(), "payload");
        assert_eq!(output.url, "https://media.example.com/a/b.txt");
    }

    #[tokio::test]
    async fn test_get_object_to_file() {
        let client = client_with("a/b.txt", b"payload").await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/b.txt");

        let output = client.get_object("a/b.txt", Some(&target)).await.unwrap();

        assert_eq!(output.size, 7);
        assert!(output.data().is_none());
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"payload");
        assert!(!dir.path().join("out/b.txt.part").exists());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let client = client_with("a/b.txt", b"payload").await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing.txt");

        let err = client.get_object("a/c.txt", Some(&target)).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!target.exists());
    }
}
