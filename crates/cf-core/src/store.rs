//! Dated partition store
//!
//! Layout: `<base>/<stage-dir>/<YYYY-MM-DD>/<artifact>`. The store is the
//! single source of truth for "what is the latest available input for a
//! stage". Partitions are never mutated after creation; re-running a stage
//! on the same day overwrites the same key, which is the expected
//! idempotent-retry behavior.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::frame::Frame;
use crate::partition::{PartitionKey, PartitionRef, StageName};

/// Filesystem-backed partition store.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    base: PathBuf,
}

impl PartitionStore {
    /// Create a store rooted at the given base directory.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The store's base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding all partitions of a stage.
    pub fn stage_dir(&self, stage: StageName) -> PathBuf {
        self.base.join(stage.data_dir())
    }

    /// Directory of one partition.
    pub fn partition_dir(&self, stage: StageName, key: &PartitionKey) -> PathBuf {
        self.stage_dir(stage).join(key.as_str())
    }

    /// Path of the artifact file inside one partition.
    pub fn artifact_path(&self, stage: StageName, key: &PartitionKey) -> PathBuf {
        self.partition_dir(stage, key).join(stage.artifact())
    }

    /// The flat metadata directory (feature registry ledger and dated
    /// per-run metadata files).
    pub fn metadata_dir(&self) -> PathBuf {
        self.base.join("metadata")
    }

    /// Directory for stage-run log output.
    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }

    /// List all valid partition keys for a stage, sorted ascending.
    ///
    /// Entries that are not directories or whose names are not valid date
    /// keys are skipped, matching how the source scripts scanned partition
    /// folders.
    pub fn list_keys(&self, stage: StageName) -> Vec<PartitionKey> {
        let dir = self.stage_dir(stage);
        let mut keys = Vec::new();
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return keys;
        };
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(key) = PartitionKey::parse(name) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        keys
    }

    /// Resolve the latest complete partition for a stage.
    ///
    /// "Latest" is the maximum key under lexicographic comparison. Fails
    /// with `NoPartitionFound` when the stage has no partitions at all, or
    /// when the newest partition directory exists but its artifact file is
    /// missing. A run that started but never completed its write must halt
    /// dependents rather than let them read stale or partial data.
    pub fn resolve_latest(&self, stage: StageName) -> CoreResult<PartitionRef> {
        let keys = self.list_keys(stage);
        let Some(key) = keys.into_iter().next_back() else {
            return Err(CoreError::NoPartitionFound {
                stage: stage.to_string(),
                detail: format!(
                    "no dated partitions under {}",
                    self.stage_dir(stage).display()
                ),
            });
        };
        let path = self.artifact_path(stage, &key);
        if !path.exists() {
            return Err(CoreError::NoPartitionFound {
                stage: stage.to_string(),
                detail: format!(
                    "partition {} exists but artifact {} is missing (incomplete write)",
                    key,
                    stage.artifact()
                ),
            });
        }
        let created_at = file_mtime(&path);
        Ok(PartitionRef {
            stage,
            key,
            path,
            row_count: None,
            created_at,
        })
    }

    /// Write a frame as the partition for `(stage, key)`.
    ///
    /// Directory creation is idempotent and an existing artifact for the
    /// same key is replaced. The write goes to a temp file and is renamed
    /// into place so a crashed write never leaves a truncated artifact
    /// behind.
    pub fn write(
        &self,
        stage: StageName,
        key: &PartitionKey,
        frame: &Frame,
    ) -> CoreResult<PartitionRef> {
        let dir = self.partition_dir(stage, key);
        std::fs::create_dir_all(&dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = self.artifact_path(stage, key);
        let temp = path.with_extension("csv.tmp");
        frame.write_csv(&temp)?;
        std::fs::rename(&temp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        log::info!(
            "wrote partition {}/{} ({} rows) to {}",
            stage,
            key,
            frame.n_rows(),
            path.display()
        );
        Ok(PartitionRef {
            stage,
            key: key.clone(),
            path,
            row_count: Some(frame.n_rows()),
            created_at: Some(Utc::now()),
        })
    }

    /// Read the frame stored in a partition.
    pub fn read(&self, partition: &PartitionRef) -> CoreResult<Frame> {
        Frame::read_csv(&partition.path)
    }
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;
    use tempfile::tempdir;

    fn frame_of(values: &[i64]) -> Frame {
        let mut frame = Frame::with_columns(&["x"]);
        for v in values {
            frame.push_row(vec![Value::Int(*v)]).unwrap();
        }
        frame
    }

    fn key(s: &str) -> PartitionKey {
        PartitionKey::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_latest_picks_maximum_key() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::new(dir.path());
        for k in ["2024-01-02", "2024-01-10", "2024-01-05"] {
            store.write(StageName::Ingest, &key(k), &frame_of(&[1])).unwrap();
        }
        let latest = store.resolve_latest(StageName::Ingest).unwrap();
        assert_eq!(latest.key.as_str(), "2024-01-10");
    }

    #[test]
    fn test_resolve_latest_empty_base_fails() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::new(dir.path().join("nowhere"));
        let err = store.resolve_latest(StageName::Ingest).unwrap_err();
        assert!(matches!(err, CoreError::NoPartitionFound { .. }));
    }

    #[test]
    fn test_resolve_latest_missing_artifact_fails() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::new(dir.path());
        // A partition directory with no artifact inside: a run that started
        // but never completed its write.
        std::fs::create_dir_all(store.partition_dir(StageName::Ingest, &key("2024-03-01")))
            .unwrap();
        let err = store.resolve_latest(StageName::Ingest).unwrap_err();
        assert!(matches!(err, CoreError::NoPartitionFound { .. }));
        assert!(err.to_string().contains("incomplete write"));
    }

    #[test]
    fn test_same_key_overwrite_replaces_content() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::new(dir.path());
        let k = key("2024-01-01");
        store.write(StageName::Ingest, &k, &frame_of(&[1, 2])).unwrap();
        store.write(StageName::Ingest, &k, &frame_of(&[7, 8, 9])).unwrap();

        let latest = store.resolve_latest(StageName::Ingest).unwrap();
        assert_eq!(latest.key, k);
        let frame = store.read(&latest).unwrap();
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.column("x").unwrap().values[0], Value::Int(7));
    }

    #[test]
    fn test_non_date_entries_ignored() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::new(dir.path());
        store.write(StageName::Ingest, &key("2024-01-01"), &frame_of(&[1])).unwrap();
        std::fs::create_dir_all(store.stage_dir(StageName::Ingest).join("scratch")).unwrap();
        std::fs::create_dir_all(store.stage_dir(StageName::Ingest).join("9999-99-99")).unwrap();

        let keys = store.list_keys(StageName::Ingest);
        assert_eq!(keys.len(), 1);
        let latest = store.resolve_latest(StageName::Ingest).unwrap();
        assert_eq!(latest.key.as_str(), "2024-01-01");
    }
}
