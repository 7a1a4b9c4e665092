//! Error types for cf-source

use thiserror::Error;

/// Row source errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// S001: Transport-level failure (connection, timeout, HTTP status)
    #[error("[S001] Fetch failed: {0}")]
    Http(String),

    /// S002: Response body could not be decoded
    #[error("[S002] Failed to decode response: {0}")]
    Decode(String),

    /// S003: A row in the payload did not have the expected shape
    #[error("[S003] Malformed row at offset {offset}: {message}")]
    MalformedRow { offset: usize, message: String },

    /// S004: Local file access failure
    #[error("[S004] Failed to read '{path}': {message}")]
    File { path: String, message: String },
}

/// Result type alias for SourceError
pub type SourceResult<T> = Result<T, SourceError>;
