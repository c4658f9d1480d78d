//! Durable multipart checkpoints.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use object_store::multipart::PartId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::TRACING_TARGET;
use crate::error::Result;

/// Hex sha256 of part bytes, recorded so a resume can tell whether the
/// payload changed.
pub fn part_digest(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A part the store has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    /// Content id returned by the store.
    pub content_id: String,
    /// [`part_digest`] of the uploaded bytes.
    pub sha256: String,
}

/// Progress of one multipart upload, persisted between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Object key.
    pub key: String,
    /// Multipart upload id issued by the store.
    pub upload_id: String,
    /// Part size the plan was built with.
    pub part_size: u64,
    /// Payload size the plan was built with.
    pub total_size: u64,
    /// Completed parts by index.
    pub parts: BTreeMap<usize, CompletedPart>,
    /// When the upload was started.
    pub created_at: Timestamp,
    /// When the last part was recorded.
    pub updated_at: Timestamp,
}

impl Checkpoint {
    /// Creates an empty checkpoint for a fresh upload.
    pub fn new(key: impl Into<String>, upload_id: impl Into<String>, part_size: u64, total_size: u64) -> Self {
        let now = Timestamp::now();
        Self {
            key: key.into(),
            upload_id: upload_id.into(),
            part_size,
            total_size,
            parts: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this checkpoint describes the same plan.
    pub fn matches(&self, key: &str, part_size: u64, total_size: u64) -> bool {
        self.key == key && self.part_size == part_size && self.total_size == total_size
    }

    /// Records a completed part.
    pub fn record_part(&mut self, index: usize, content_id: impl Into<String>, sha256: impl Into<String>) {
        let part = CompletedPart {
            content_id: content_id.into(),
            sha256: sha256.into(),
        };
        self.parts.insert(index, part);
        self.updated_at = Timestamp::now();
    }

    /// Whether part `index` is already uploaded.
    pub fn is_done(&self, index: usize) -> bool {
        self.parts.contains_key(&index)
    }

    /// Bytes covered by the recorded parts of `plan`.
    pub fn completed_bytes(&self, plan: &[Range<u64>]) -> u64 {
        self.parts
            .keys()
            .filter_map(|index| plan.get(*index))
            .map(|range| range.end - range.start)
            .sum()
    }

    /// Whether all `total_parts` parts are recorded.
    pub fn is_complete(&self, total_parts: usize) -> bool {
        (0..total_parts).all(|index| self.is_done(index))
    }

    /// Recorded part ids in part order.
    pub fn part_ids(&self) -> Vec<PartId> {
        self.parts
            .values()
            .map(|part| PartId {
                content_id: part.content_id.clone(),
            })
            .collect()
    }
}

/// Directory of checkpoint files, one per object key.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Creates a store rooted at `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the checkpoint of `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Loads the checkpoint of `key`.
    ///
    /// Missing and unreadable files both yield `None`; an unreadable file is
    /// removed so the next save starts clean.
    pub async fn load(&self, key: &str) -> Result<Option<Checkpoint>> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice::<Checkpoint>(&raw) {
            Ok(checkpoint) if checkpoint.key == key => Ok(Some(checkpoint)),
            Ok(_) => Ok(None),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    path = %path.display(),
                    error = %err,
                    "Discarding unreadable checkpoint"
                );
                self.remove(key).await?;
                Ok(None)
            }
        }
    }

    /// Persists `checkpoint`, replacing any previous one atomically.
    pub async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&checkpoint.key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(checkpoint)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Removes the checkpoint of `key`, if any.
    pub async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested"));

        let mut checkpoint = Checkpoint::new("videos/a.mp4", "upload-1", 5, 12);
        checkpoint.record_part(1, "etag-1", part_digest(b"hello"));
        store.save(&checkpoint).await.unwrap();

        let loaded = store.load("videos/a.mp4").await.unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert!(store.load("videos/b.mp4").await.unwrap().is_none());

        store.remove("videos/a.mp4").await.unwrap();
        assert!(store.load("videos/a.mp4").await.unwrap().is_none());
        store.remove("videos/a.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_checkpoint_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let path = store.path_for("a.bin");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        assert!(store.load("a.bin").await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_part_digest() {
        assert_eq!(part_digest(b"AAAA"), part_digest(b"AAAA"));
        assert_ne!(part_digest(b"AAAA"), part_digest(b"BBBB"));
        assert_eq!(part_digest(b"").len(), 64);
    }

    #[tokio::test]
    async fn test_checkpoint_without_digests_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let legacy = serde_json::json!({
            "key": "a.bin",
            "upload_id": "u",
            "part_size": 4,
            "total_size": 8,
            "parts": { "0": "etag-0" },
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
        });
        tokio::fs::write(store.path_for("a.bin"), legacy.to_string()).await.unwrap();

        assert!(store.load("a.bin").await.unwrap().is_none());
    }

    #[test]
    fn test_path_is_key_digest() {
        let store = CheckpointStore::new("/tmp/checkpoints");
        let path = store.path_for("a.bin");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 64 + ".json".len());
        assert_ne!(path, store.path_for("b.bin"));
    }

    #[test]
    fn test_plan_accounting() {
        let plan = vec![0..5, 5..10, 10..12];
        let mut checkpoint = Checkpoint::new("a.bin", "u", 5, 12);
        assert!(checkpoint.matches("a.bin", 5, 12));
        assert!(!checkpoint.matches("a.bin", 4, 12));

        checkpoint.record_part(0, "e0", "d0");
        checkpoint.record_part(2, "e2", "d2");
        assert_eq!(checkpoint.completed_bytes(&plan), 7);
        assert!(!checkpoint.is_complete(3));

        checkpoint.record_part(1, "e1", "d1");
        assert!(checkpoint.is_complete(3));
        let ids: Vec<_> = checkpoint.part_ids().into_iter().map(|p| p.content_id).collect();
        assert_eq!(ids, vec!["e0", "e1", "e2"]);
    }
}
