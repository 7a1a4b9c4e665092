//! Error types for cf-core

use thiserror::Error;

/// Core error type for Churnflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: No usable partition found for a stage
    #[error("[E003] No partition found for stage '{stage}': {detail}")]
    NoPartitionFound { stage: String, detail: String },

    /// E004: Invalid partition key (must be a zero-padded YYYY-MM-DD date)
    #[error("[E004] Invalid partition key '{key}': expected YYYY-MM-DD")]
    InvalidPartitionKey { key: String },

    /// E005: Malformed CSV content
    #[error("[E005] CSV parse error in {path}: {message}")]
    CsvParse { path: String, message: String },

    /// E006: Frame shape violation (ragged row, duplicate column, length mismatch)
    #[error("[E006] Frame error: {message}")]
    FrameShape { message: String },

    /// E007: Column not found in frame
    #[error("[E007] Column not found: {name}")]
    ColumnNotFound { name: String },

    /// E008: IO error
    #[error("[E008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E009: IO error with file path context
    #[error("[E009] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E010: YAML parse error
    #[error("[E010] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
