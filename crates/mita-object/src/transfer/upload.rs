use object_store::{ObjectStore, PutPayload};

use super::{Payload, TRACING_TARGET, UploadOutput};
use crate::client::{TransferClient, object_path};
use crate::error::Result;

impl TransferClient {
    /// Uploads `payload` to `key` in a single request.
    pub async fn put_object(&self, key: &str, payload: &Payload) -> Result<UploadOutput> {
        let path = object_path(key)?;
        let data = payload.read_all().await?;
        let size = data.len() as u64;

        tracing::debug!(
            target: TRACING_TARGET,
            key,
            size,
            "Uploading object"
        );

        let result = self
            .objects()
            .put(&path, PutPayload::from(data))
            .await?;

        Ok(UploadOutput {
            key: key.to_owned(),
            size,
            e_tag: result.e_tag,
            version: result.version,
            url: self.location().object_url(key),
        })
    }
}
