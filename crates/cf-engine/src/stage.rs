//! Uniform stage contract
//!
//! Every stage is a function of `(resolved upstream partition, config)` to
//! `(output partition, metadata)` plus durable writes. A stage resolves its
//! input only through its single declared upstream, never two levels back,
//! which keeps lineage a simple linear chain.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use cf_core::config::{Config, SourceKind, WarehouseKind};
use cf_core::error::CoreError;
use cf_core::frame::Frame;
use cf_core::partition::{PartitionKey, PartitionRef, StageName};
use cf_core::store::PartitionStore;
use cf_db::{DuckDbWarehouse, SnowflakeWarehouse, Warehouse};
use cf_source::{CsvFileSource, HttpRowSource, RowSource};

use crate::error::{EngineError, EngineResult};

/// Everything a stage needs to execute: explicit configuration, the
/// partition store, the target partition key, and the external
/// collaborators (row source, warehouse) when configured.
pub struct StageContext {
    pub config: Arc<Config>,
    pub store: PartitionStore,
    pub key: PartitionKey,
    pub source: Option<Arc<dyn RowSource>>,
    pub warehouse: Option<Arc<dyn Warehouse>>,
}

impl StageContext {
    /// Build a context from configuration, wiring up the configured row
    /// source and warehouse.
    pub fn from_config(
        config: Arc<Config>,
        project_root: &std::path::Path,
        key: PartitionKey,
    ) -> EngineResult<Self> {
        let store = PartitionStore::new(config.data_root_absolute(project_root));

        let source: Option<Arc<dyn RowSource>> = match &config.fetch {
            Some(fetch) => match fetch.kind {
                SourceKind::Http => {
                    let source = HttpRowSource::from_config(fetch).map_err(|e| {
                        EngineError::ExternalService {
                            stage: StageName::Fetch.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    Some(Arc::new(source))
                }
                SourceKind::File => {
                    let path = fetch.path.as_deref().unwrap_or_default();
                    let resolved = if std::path::Path::new(path).is_absolute() {
                        PathBuf::from(path)
                    } else {
                        project_root.join(path)
                    };
                    Some(Arc::new(CsvFileSource::new(resolved)))
                }
            },
            None => None,
        };

        let warehouse: Option<Arc<dyn Warehouse>> = match &config.warehouse {
            Some(wh) => match wh.kind {
                WarehouseKind::DuckDb => {
                    let path = if wh.path == ":memory:" || std::path::Path::new(&wh.path).is_absolute() {
                        wh.path.clone()
                    } else {
                        project_root.join(&wh.path).display().to_string()
                    };
                    let backend = DuckDbWarehouse::new(&path).map_err(|e| {
                        EngineError::ExternalService {
                            stage: StageName::Ingest.to_string(),
                            message: e.to_string(),
                        }
                    })?;
                    Some(Arc::new(backend))
                }
                WarehouseKind::Snowflake => {
                    let backend =
                        SnowflakeWarehouse::new(wh.credentials.clone()).map_err(|e| {
                            EngineError::ExternalService {
                                stage: StageName::Ingest.to_string(),
                                message: e.to_string(),
                            }
                        })?;
                    Some(Arc::new(backend))
                }
            },
            None => None,
        };

        Ok(Self {
            config,
            store,
            key,
            source,
            warehouse,
        })
    }

    /// Resolve this stage's declared upstream partition and read its frame.
    ///
    /// A missing upstream surfaces as `UpstreamMissing`; the underlying
    /// store error distinguishes "no runs yet" from "incomplete write".
    pub fn resolve_upstream(
        &self,
        stage: StageName,
        upstream: StageName,
    ) -> EngineResult<(PartitionRef, Frame)> {
        let partition = self.store.resolve_latest(upstream).map_err(|e| match e {
            CoreError::NoPartitionFound { detail, .. } => EngineError::UpstreamMissing {
                stage: stage.to_string(),
                detail,
            },
            other => EngineError::Core(other),
        })?;
        let frame = self.store.read(&partition)?;
        Ok((partition, frame))
    }
}

/// What a completed stage reports back to the orchestrator.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// The partition this stage produced, if it produces one
    pub partition: Option<PartitionRef>,

    /// Rows processed or written
    pub rows: Option<usize>,

    /// Human-readable note for the run report
    pub detail: Option<String>,
}

impl StageOutcome {
    pub fn partition(partition: PartitionRef) -> Self {
        let rows = partition.row_count;
        Self {
            partition: Some(partition),
            rows,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// One pipeline stage.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage identity within the chain.
    fn name(&self) -> StageName;

    /// The single stage area this stage reads from, if any.
    fn upstream(&self) -> Option<StageName>;

    /// Execute the stage against the context's target partition key.
    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome>;
}
