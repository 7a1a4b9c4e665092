//! Partition keys, stage names, and partition references
//!
//! A partition is an immutable dated snapshot of tabular data produced by
//! exactly one pipeline stage. Keys are zero-padded `YYYY-MM-DD` strings so
//! that lexicographic order coincides with chronological order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

/// A validated `YYYY-MM-DD` partition key.
///
/// The zero-padded format is an invariant: it is what makes the maximum key
/// under string comparison also the chronologically latest one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Parse and validate a partition key from a string.
    pub fn parse(key: impl Into<String>) -> CoreResult<Self> {
        let s = key.into();
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(CoreError::InvalidPartitionKey { key: s })
        }
    }

    /// Build a partition key from a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// The partition key for the current UTC calendar day.
    pub fn today() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    /// Return the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string() == s)
            .unwrap_or(false)
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartitionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PartitionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PartitionKey::parse(s).map_err(serde::de::Error::custom)
    }
}

/// The fixed set of pipeline stages, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Fetch,
    Ingest,
    Validate,
    Prepare,
    Transform,
    RegisterFeatures,
    Train,
}

impl StageName {
    /// All stages in declared execution order.
    pub const CHAIN: [StageName; 7] = [
        StageName::Fetch,
        StageName::Ingest,
        StageName::Validate,
        StageName::Prepare,
        StageName::Transform,
        StageName::RegisterFeatures,
        StageName::Train,
    ];

    /// Stage name as used in logs and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Fetch => "fetch",
            StageName::Ingest => "ingest",
            StageName::Validate => "validate",
            StageName::Prepare => "prepare",
            StageName::Transform => "transform",
            StageName::RegisterFeatures => "register_features",
            StageName::Train => "train",
        }
    }

    /// Directory under the data root where this stage's partitions live.
    pub fn data_dir(&self) -> &'static str {
        match self {
            StageName::Fetch => "landing",
            StageName::Ingest => "raw",
            StageName::Validate => "validation",
            StageName::Prepare => "processed",
            StageName::Transform => "transformed",
            StageName::RegisterFeatures => "metadata",
            StageName::Train => "models",
        }
    }

    /// The artifact file a completed partition of this stage must contain.
    pub fn artifact(&self) -> &'static str {
        match self {
            StageName::Fetch => "customer_churn_fetched.csv",
            StageName::Ingest => "customer_churn_raw.csv",
            StageName::Validate => "data_validation_report.csv",
            StageName::Prepare => "customer_churn_cleaned.csv",
            StageName::Transform => "customer_churn_transformed.csv",
            StageName::RegisterFeatures => "feature_registry.json",
            StageName::Train => "churn_model.json",
        }
    }

    /// Stages whose partitions are dated directories on disk
    /// (the feature registry keeps a flat ledger instead).
    pub fn partitioned() -> impl Iterator<Item = StageName> {
        Self::CHAIN
            .into_iter()
            .filter(|s| !matches!(s, StageName::RegisterFeatures))
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch" => Ok(StageName::Fetch),
            "ingest" => Ok(StageName::Ingest),
            "validate" => Ok(StageName::Validate),
            "prepare" => Ok(StageName::Prepare),
            "transform" => Ok(StageName::Transform),
            "register_features" | "register-features" => Ok(StageName::RegisterFeatures),
            "train" => Ok(StageName::Train),
            other => Err(format!(
                "unknown stage '{}'. Valid stages: fetch, ingest, validate, prepare, transform, register_features, train",
                other
            )),
        }
    }
}

/// Reference to one stored partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionRef {
    /// The stage that produced this partition
    pub stage: StageName,

    /// Dated partition key
    pub key: PartitionKey,

    /// Path to the partition's artifact file
    pub path: PathBuf,

    /// Rows in the artifact, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,

    /// When the partition was written, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parse_valid() {
        let key = PartitionKey::parse("2024-01-01").unwrap();
        assert_eq!(key.as_str(), "2024-01-01");
    }

    #[test]
    fn test_key_parse_rejects_unpadded() {
        assert!(PartitionKey::parse("2024-1-1").is_err());
        assert!(PartitionKey::parse("2024/01/01").is_err());
        assert!(PartitionKey::parse("20240101").is_err());
        assert!(PartitionKey::parse("not-a-date").is_err());
        assert!(PartitionKey::parse("2024-13-01").is_err());
    }

    #[test]
    fn test_lexicographic_matches_chronological() {
        let keys = [
            "2023-12-31",
            "2024-01-01",
            "2024-01-02",
            "2024-02-01",
            "2024-10-09",
            "2024-11-08",
        ];
        let mut parsed: Vec<PartitionKey> = keys
            .iter()
            .map(|k| PartitionKey::parse(*k).unwrap())
            .collect();
        parsed.sort();
        let sorted: Vec<&str> = parsed.iter().map(|k| k.as_str()).collect();
        assert_eq!(sorted, keys);
        assert_eq!(parsed.last().unwrap().as_str(), "2024-11-08");
    }

    #[test]
    fn test_stage_round_trip() {
        for stage in StageName::CHAIN {
            let parsed: StageName = stage.as_str().parse().unwrap();
            assert_eq!(parsed, stage);
        }
        assert!("warehouse".parse::<StageName>().is_err());
    }

    #[test]
    fn test_chain_order() {
        assert_eq!(StageName::CHAIN[0], StageName::Fetch);
        assert_eq!(StageName::CHAIN[6], StageName::Train);
    }
}
