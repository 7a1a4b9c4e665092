//! cf-engine - Pipeline engine for Churnflow
//!
//! This crate provides the uniform stage contract, the seven concrete
//! pipeline stages, the validation and transformation engines, the model
//! trainer contract with its baseline implementation, and the orchestrator
//! that runs the stage chain with retry and failure isolation.

pub mod derive;
pub mod error;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod stage;
pub mod stages;

pub use derive::{builtin_derivations, Derivation, Formula};
pub use error::{EngineError, EngineResult};
pub use metrics::EvalMetrics;
pub use model::{LogisticRegressionTrainer, ModelTrainer, TrainedModel};
pub use orchestrator::{Orchestrator, RunReport, StageReport};
pub use stage::{Stage, StageContext, StageOutcome};
pub use stages::standard_chain;
pub use stages::validate::{profile_column, profile_frame, CheckStatus, ColumnProfile};
