//! Error types for cf-engine
//!
//! The stage-facing taxonomy: an upstream dependency that was never
//! produced, data that fails a required transformation, and an external
//! service (fetch or warehouse) that failed. Only the last is retryable;
//! retrying a processing error without a data fix would repeat the failure.

use thiserror::Error;

use cf_core::error::CoreError;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    /// P001: This stage's declared upstream dependency is absent
    #[error("[P001] Upstream partition missing for stage '{stage}': {detail}")]
    UpstreamMissing { stage: String, detail: String },

    /// P002: Data is present but fails a required transformation or coercion
    #[error("[P002] Processing failed in stage '{stage}': {message}")]
    Processing { stage: String, message: String },

    /// P003: An external fetch or warehouse call failed
    #[error("[P003] External service failure in stage '{stage}': {message}")]
    ExternalService { stage: String, message: String },

    /// Wrapped core error (store, frame, config IO)
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EngineError {
    /// Whether the orchestrator may retry this failure automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::ExternalService { .. })
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
