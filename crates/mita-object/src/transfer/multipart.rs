use std::ops::Range;

use futures::StreamExt;
use object_store::MultipartId;
use object_store::path::Path as ObjectPath;

use super::{
    Checkpoint, CheckpointStore, MultipartOutput, Payload, TRACING_TARGET, TransferProgress,
    part_digest,
};
use crate::client::{TransferClient, object_path};
use crate::error::{Error, Result};

/// Default part size of multipart uploads: 5 MiB.
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Default number of part uploads in flight.
pub const DEFAULT_PARALLELISM: usize = 5;

/// Splits `total` bytes into consecutive parts of `part_size` bytes.
///
/// The last part carries the remainder; an empty payload yields a single
/// empty part so the upload still commits an object.
pub fn plan_parts(total: u64, part_size: u64) -> Vec<Range<u64>> {
    let part_size = part_size.max(1);
    if total == 0 {
        return vec![0..0];
    }

    (0..total.div_ceil(part_size))
        .map(|index| {
            let start = index * part_size;
            start..(start + part_size).min(total)
        })
        .collect()
}

/// Settings of one multipart upload.
#[derive(Clone, Copy)]
pub struct MultipartOptions<'a> {
    /// Size of each part in bytes.
    pub part_size: u64,
    /// Maximum part uploads in flight.
    pub parallelism: usize,
    /// Where progress is persisted between attempts.
    pub checkpoints: &'a CheckpointStore,
    /// Called after every completed part.
    pub progress: Option<&'a (dyn Fn(&TransferProgress) + Send + Sync)>,
}

impl TransferClient {
    /// Uploads `payload` to `key` in parts, resuming from a checkpoint.
    ///
    /// A checkpoint matching the key, part size and payload size is resumed
    /// when every recorded part still hashes to the same digest: its upload
    /// id is reused and recorded parts are skipped. Every finished
    /// part is persisted before progress is reported. The checkpoint is
    /// removed once the upload is committed, and also when the store no
    /// longer knows the upload id.
    pub async fn put_multipart(
        &self,
        key: &str,
        payload: &Payload,
        options: MultipartOptions<'_>,
    ) -> Result<MultipartOutput> {
        let checkpoints = options.checkpoints;
        let total_size = payload.size().await?;
        let plan = plan_parts(total_size, options.part_size);
        let path = object_path(key)?;

        let previous = checkpoints.load(key).await?;
        let resumable = match &previous {
            Some(checkpoint) if checkpoint.matches(key, options.part_size, total_size) => {
                recorded_parts_unchanged(checkpoint, payload, &plan).await?
            }
            _ => false,
        };

        let (mut checkpoint, resumed) = match previous {
            Some(checkpoint) if resumable => {
                tracing::info!(
                    target: TRACING_TARGET,
                    key,
                    upload_id = %checkpoint.upload_id,
                    completed_parts = checkpoint.parts.len(),
                    "Resuming multipart upload from checkpoint"
                );
                (checkpoint, true)
            }
            stale => {
                if let Some(stale) = stale {
                    self.abandon(&path, &stale.upload_id).await;
                }
                let upload_id = self.multipart().create_multipart(&path).await?;
                let checkpoint = Checkpoint::new(key, upload_id, options.part_size, total_size);
                checkpoints.save(&checkpoint).await?;
                (checkpoint, false)
            }
        };

        tracing::debug!(
            target: TRACING_TARGET,
            key,
            source = %payload.describe(),
            total_size,
            parts = plan.len(),
            part_size = options.part_size,
            parallelism = options.parallelism,
            "Uploading parts"
        );

        let upload_id: MultipartId = checkpoint.upload_id.clone();
        let pending: Vec<usize> = (0..plan.len()).filter(|i| !checkpoint.is_done(*i)).collect();
        let mut progress = TransferProgress {
            completed_parts: checkpoint.parts.len(),
            total_parts: plan.len(),
            transferred_bytes: checkpoint.completed_bytes(&plan),
            total_bytes: total_size,
        };

        let store = self.multipart();
        let (path_ref, id_ref, plan_ref) = (&path, &upload_id, &plan);
        let mut uploads = futures::stream::iter(pending)
            .map(move |index| async move {
                let data = payload.read_range(plan_ref[index].clone()).await?;
                let digest = part_digest(&data);
                let part = store.put_part(path_ref, id_ref, index, data.into()).await?;
                Ok::<_, Error>((index, part, digest))
            })
            .buffer_unordered(options.parallelism.max(1));

        while let Some(result) = uploads.next().await {
            let (index, part, digest) = match result {
                Ok(done) => done,
                Err(err) => return Err(discard_if_unknown(err, key, checkpoints).await),
            };

            checkpoint.record_part(index, part.content_id, digest);
            checkpoints.save(&checkpoint).await?;

            let range = &plan[index];
            progress.completed_parts += 1;
            progress.transferred_bytes += range.end - range.start;

            tracing::debug!(
                target: TRACING_TARGET,
                key,
                part = index,
                percent = progress.percent(),
                "Part uploaded"
            );

            if let Some(notify) = options.progress {
                notify(&progress);
            }
        }
        drop(uploads);
        debug_assert!(checkpoint.is_complete(plan.len()));

        let result = match store
            .complete_multipart(&path, &upload_id, checkpoint.part_ids())
            .await
        {
            Ok(result) => result,
            Err(err) => return Err(discard_if_unknown(err.into(), key, checkpoints).await),
        };

        checkpoints.remove(key).await?;

        Ok(MultipartOutput {
            key: key.to_owned(),
            size: total_size,
            parts: plan.len(),
            resumed,
            e_tag: result.e_tag,
            version: result.version,
            url: self.location().object_url(key),
        })
    }

    async fn abandon(&self, path: &ObjectPath, upload_id: &MultipartId) {
        if let Err(err) = self.multipart().abort_multipart(path, upload_id).await {
            tracing::debug!(
                target: TRACING_TARGET,
                upload_id = %upload_id,
                error = %err,
                "Could not abort superseded multipart upload"
            );
        }
    }
}

/// Whether every part recorded in `checkpoint` still matches `payload`.
async fn recorded_parts_unchanged(
    checkpoint: &Checkpoint,
    payload: &Payload,
    plan: &[Range<u64>],
) -> Result<bool> {
    for (index, part) in &checkpoint.parts {
        let Some(range) = plan.get(*index) else {
            return Ok(false);
        };
        let data = payload.read_range(range.clone()).await?;
        if part_digest(&data) != part.sha256 {
            tracing::info!(
                target: TRACING_TARGET,
                key = %checkpoint.key,
                part = index,
                "Payload changed since the checkpoint was written, starting over"
            );
            return Ok(false);
        }
    }
    Ok(true)
}

async fn discard_if_unknown(err: Error, key: &str, checkpoints: &CheckpointStore) -> Error {
    if err.is_not_found() {
        tracing::warn!(
            target: TRACING_TARGET,
            key,
            "Store no longer knows the multipart upload, discarding checkpoint"
        );
        if let Err(remove_err) = checkpoints.remove(key).await {
            tracing::warn!(
                target: TRACING_TARGET,
                key,
                error = %remove_err,
                "Could not remove checkpoint"
            );
        }
    }
    err
}
