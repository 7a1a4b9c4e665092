//! Configuration types and parsing for churnflow.yml
//!
//! All tunable state is explicit configuration threaded into components at
//! construction. Nothing reads the ambient environment at arbitrary points;
//! the one exception is warehouse credentials, which are resolved from
//! environment variables once at load time and never serialized back out.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from churnflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Base directory for all partitions, metadata, logs, and models
    #[serde(default = "default_data_root")]
    pub data_root: String,

    /// Name of the binary prediction target column
    #[serde(default = "default_target_column")]
    pub target_column: String,

    /// Version tag recorded with newly registered features
    #[serde(default = "default_feature_version")]
    pub feature_version: String,

    /// Columns that encode outcome-adjacent information unavailable at
    /// prediction time; dropped unconditionally before feature derivation.
    /// Matched case-insensitively, tolerant of absent columns.
    #[serde(default = "default_leakage_columns")]
    pub leakage_columns: Vec<String>,

    /// Columns that identify rows; exempt from uniqueness checks and
    /// excluded from the model feature matrix.
    #[serde(default = "default_identifier_columns")]
    pub identifier_columns: Vec<String>,

    /// Raw-row source configuration
    #[serde(default)]
    pub fetch: Option<FetchConfig>,

    /// External warehouse configuration. When absent, the ingest stage
    /// lands the fetched partition directly (local mode).
    #[serde(default)]
    pub warehouse: Option<WarehouseConfig>,

    /// Retry policy for retryable stage failures
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Which kind of row source to fetch from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Paged HTTP row API
    #[default]
    Http,
    /// Local CSV file
    File,
}

/// Raw data fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Source kind (http or file)
    #[serde(default)]
    pub kind: SourceKind,

    /// Base URL of the row API (http kind)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Dataset name requested from the row API (http kind)
    #[serde(default)]
    pub dataset: Option<String>,

    /// Dataset config name (http kind)
    #[serde(default = "default_dataset_config")]
    pub config: String,

    /// Dataset split (http kind)
    #[serde(default = "default_split")]
    pub split: String,

    /// Path to the source CSV (file kind)
    #[serde(default)]
    pub path: Option<String>,

    /// Rows requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Deadline for each fetch call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Warehouse backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseKind {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// Snowflake
    Snowflake,
}

impl std::fmt::Display for WarehouseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseKind::DuckDb => write!(f, "duckdb"),
            WarehouseKind::Snowflake => write!(f, "snowflake"),
        }
    }
}

/// External warehouse configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseConfig {
    /// Warehouse type (duckdb or snowflake)
    #[serde(rename = "type", default)]
    pub kind: WarehouseKind,

    /// Database path for DuckDB (file path or :memory:)
    #[serde(default = "default_warehouse_path")]
    pub path: String,

    /// Table the raw dataset is uploaded to
    #[serde(default = "default_raw_table")]
    pub table: String,

    /// Credentials resolved from the environment at load time.
    /// Never read from the config file and never written back.
    #[serde(skip)]
    pub credentials: Option<WarehouseCredentials>,
}

/// Warehouse credentials, sourced only from environment variables
/// (`CHURNFLOW_WH_USER`, `CHURNFLOW_WH_PASSWORD`, `CHURNFLOW_WH_ACCOUNT`).
#[derive(Clone)]
pub struct WarehouseCredentials {
    pub user: String,
    pub password: String,
    pub account: String,
}

impl std::fmt::Debug for WarehouseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

impl WarehouseCredentials {
    /// Resolve credentials from the environment. Returns `None` when any
    /// variable is unset; the caller decides whether that is fatal.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            user: std::env::var("CHURNFLOW_WH_USER").ok()?,
            password: std::env::var("CHURNFLOW_WH_PASSWORD").ok()?,
            account: std::env::var("CHURNFLOW_WH_ACCOUNT").ok()?,
        })
    }
}

/// Retry policy for retryable stage failures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Additional attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_data_root() -> String {
    "data".to_string()
}

fn default_target_column() -> String {
    "churn".to_string()
}

fn default_feature_version() -> String {
    "v1".to_string()
}

fn default_leakage_columns() -> Vec<String> {
    // Union of the leakage lists across the historical pipeline variants.
    [
        "customer status",
        "cltv",
        "total revenue",
        "total charges",
        "churn category",
        "churn reason",
        "churn score",
        "lat long",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_identifier_columns() -> Vec<String> {
    vec!["customer_id".to_string()]
}

fn default_base_url() -> String {
    "https://datasets-server.huggingface.co/rows".to_string()
}

fn default_dataset_config() -> String {
    "default".to_string()
}

fn default_split() -> String {
    "train".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_warehouse_path() -> String {
    ":memory:".to_string()
}

fn default_raw_table() -> String {
    "customer_churn_raw".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        if let Some(warehouse) = &mut config.warehouse {
            if warehouse.kind == WarehouseKind::Snowflake {
                warehouse.credentials = WarehouseCredentials::from_env();
            }
        }
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for churnflow.yml or churnflow.yaml.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("churnflow.yml");
        let yaml_path = dir.join("churnflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.target_column.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "target_column cannot be empty".to_string(),
            });
        }
        if let Some(fetch) = &self.fetch {
            match fetch.kind {
                SourceKind::Http if fetch.dataset.is_none() => {
                    return Err(CoreError::ConfigInvalid {
                        message: "fetch.dataset is required for an http source".to_string(),
                    });
                }
                SourceKind::File if fetch.path.is_none() => {
                    return Err(CoreError::ConfigInvalid {
                        message: "fetch.path is required for a file source".to_string(),
                    });
                }
                _ => {}
            }
            if fetch.page_size == 0 {
                return Err(CoreError::ConfigInvalid {
                    message: "fetch.page_size must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Absolute data root relative to a project root.
    pub fn data_root_absolute(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.data_root);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// Whether a column name is a declared identifier, case-insensitively.
    pub fn is_identifier_column(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.identifier_columns
            .iter()
            .any(|c| c.to_lowercase() == lower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = "name: churn_pipeline\n";

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.data_root, "data");
        assert_eq!(config.target_column, "churn");
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay_ms, 1000);
        assert!(config.warehouse.is_none());
        assert!(config.leakage_columns.contains(&"churn score".to_string()));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("churnflow.yml"), MINIMAL).unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.name, "churn_pipeline");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let err = Config::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "name: p\nsurprise: true\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_http_fetch_requires_dataset() {
        let dir = tempdir().unwrap();
        let yaml = "name: p\nfetch:\n  kind: http\n";
        let path = dir.path().join("churnflow.yml");
        std::fs::write(&path, yaml).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_file_fetch_requires_path() {
        let dir = tempdir().unwrap();
        let yaml = "name: p\nfetch:\n  kind: file\n";
        let path = dir.path().join("churnflow.yml");
        std::fs::write(&path, yaml).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_identifier_lookup_case_insensitive() {
        let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
        assert!(config.is_identifier_column("Customer_ID"));
        assert!(!config.is_identifier_column("age"));
    }
}
