//! cf-core - Core library for Churnflow
//!
//! This crate provides shared types, configuration parsing, the tabular
//! frame data model, the dated partition store, column contracts, the
//! feature registry ledger, and stage-run tracking used across all
//! Churnflow components.

pub mod config;
pub mod contract;
pub mod error;
pub mod frame;
pub mod partition;
pub mod registry;
pub mod run;
pub mod store;

pub use config::{Config, FetchConfig, RetryConfig, SourceKind, WarehouseConfig, WarehouseKind};
pub use contract::{binary_value, ColumnContract, ColumnSpec, ContractReport, SemanticType};
pub use error::{CoreError, CoreResult};
pub use frame::{Column, Frame, Value};
pub use partition::{PartitionKey, PartitionRef, StageName};
pub use registry::{FeatureRecord, FeatureRegistry};
pub use run::{PipelineRunState, RunLog, RunOutcome, RunStatus, StageRun};
pub use store::PartitionStore;
