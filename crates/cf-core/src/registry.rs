//! Feature registry ledger
//!
//! An append-only metadata ledger mapping feature name to description,
//! version, and source partition. New runs append new rows or new versions;
//! nothing is ever overwritten in place, so the ledger answers "when was
//! this feature introduced and from which partition".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::partition::PartitionKey;

/// One registered feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Derived column name
    pub name: String,

    /// Human-readable formula description
    pub description: String,

    /// Version tag for this registration
    pub version: String,

    /// Partition the feature values were derived from
    pub source_partition: PartitionKey,

    /// When the record was appended
    pub created_at: DateTime<Utc>,
}

/// Append-only feature ledger backed by a JSON file, with a dated
/// per-run metadata file written alongside each batch.
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    metadata_dir: PathBuf,
}

impl FeatureRegistry {
    /// Create a registry rooted at the given metadata directory.
    pub fn new(metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
        }
    }

    /// Path of the cumulative ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.metadata_dir.join("feature_registry.json")
    }

    /// Path of the dated metadata file for one run.
    pub fn run_metadata_path(&self, key: &PartitionKey) -> PathBuf {
        self.metadata_dir.join(format!("{}_features.json", key))
    }

    /// Load all ledger records. An absent ledger is an empty ledger.
    pub fn load(&self) -> CoreResult<Vec<FeatureRecord>> {
        let path = self.ledger_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let records: Vec<FeatureRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }

    /// Append a batch of records to the ledger.
    ///
    /// The new batch is concatenated after the existing rows, never
    /// replacing them. Also writes the dated per-run metadata file.
    /// Returns the total ledger size after the append.
    pub fn register(&self, batch: &[FeatureRecord], key: &PartitionKey) -> CoreResult<usize> {
        std::fs::create_dir_all(&self.metadata_dir).map_err(|e| CoreError::IoWithPath {
            path: self.metadata_dir.display().to_string(),
            source: e,
        })?;

        let mut records = self.load()?;
        records.extend(batch.iter().cloned());
        write_json_atomic(&self.ledger_path(), &records)?;
        write_json_atomic(&self.run_metadata_path(key), &batch)?;

        log::info!(
            "registered {} feature(s); ledger now has {} record(s)",
            batch.len(),
            records.len()
        );
        Ok(records.len())
    }
}

/// Serialize as pretty JSON and write via temp-then-rename.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, data: &T) -> CoreResult<()> {
    let json = serde_json::to_string_pretty(data)?;
    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, json).map_err(|e| CoreError::IoWithPath {
        path: temp.display().to_string(),
        source: e,
    })?;
    std::fs::rename(&temp, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(name: &str, key: &str) -> FeatureRecord {
        FeatureRecord {
            name: name.to_string(),
            description: format!("{} formula", name),
            version: "v1".to_string(),
            source_partition: PartitionKey::parse(key).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_ledger_loads_empty() {
        let dir = tempdir().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        assert!(registry.load().unwrap().is_empty());
    }

    #[test]
    fn test_register_appends_to_empty_ledger() {
        let dir = tempdir().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        let key = PartitionKey::parse("2024-01-01").unwrap();
        let total = registry.register(&[record("tenure_years", "2024-01-01")], &key).unwrap();
        assert_eq!(total, 1);
        assert_eq!(registry.load().unwrap().len(), 1);
        assert!(registry.run_metadata_path(&key).exists());
    }

    #[test]
    fn test_register_concatenates_never_replaces() {
        let dir = tempdir().unwrap();
        let registry = FeatureRegistry::new(dir.path());
        let k1 = PartitionKey::parse("2024-01-01").unwrap();
        let k2 = PartitionKey::parse("2024-01-02").unwrap();
        registry.register(&[record("tenure_years", "2024-01-01")], &k1).unwrap();
        registry
            .register(
                &[record("tenure_years", "2024-01-02"), record("activity_rate", "2024-01-02")],
                &k2,
            )
            .unwrap();

        let records = registry.load().unwrap();
        assert_eq!(records.len(), 3);
        // history preserved in append order
        assert_eq!(records[0].source_partition.as_str(), "2024-01-01");
        assert_eq!(records[2].name, "activity_rate");
    }
}
