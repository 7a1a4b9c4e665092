//! Ingest stage: land the fetched batch as the raw partition
//!
//! With a warehouse configured, the batch round-trips through it (upload
//! to the raw table with overwrite, query back, land what the warehouse
//! returns) so the raw partition reflects the durable table. Without one,
//! the fetched frame lands directly (local mode).

use async_trait::async_trait;

use cf_core::partition::StageName;

use crate::error::{EngineError, EngineResult};
use crate::stage::{Stage, StageContext, StageOutcome};

pub struct IngestStage;

#[async_trait]
impl Stage for IngestStage {
    fn name(&self) -> StageName {
        StageName::Ingest
    }

    fn upstream(&self) -> Option<StageName> {
        Some(StageName::Fetch)
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let (upstream, frame) = ctx.resolve_upstream(self.name(), StageName::Fetch)?;
        log::info!(
            "ingesting {} rows from partition {}",
            frame.n_rows(),
            upstream.key
        );

        let (landed, detail) = match &ctx.warehouse {
            Some(warehouse) => {
                let table = ctx
                    .config
                    .warehouse
                    .as_ref()
                    .map(|w| w.table.clone())
                    .unwrap_or_else(|| "customer_churn_raw".to_string());

                let rows = warehouse
                    .upload(&table, &frame, true)
                    .await
                    .map_err(|e| EngineError::ExternalService {
                        stage: self.name().to_string(),
                        message: e.to_string(),
                    })?;
                log::info!("uploaded {} rows to {} table '{}'", rows, warehouse.db_type(), table);

                let quoted = format!("\"{}\"", table.replace('"', "\"\""));
                let stored = warehouse
                    .query(&format!("SELECT * FROM {}", quoted))
                    .await
                    .map_err(|e| EngineError::ExternalService {
                        stage: self.name().to_string(),
                        message: e.to_string(),
                    })?;
                (stored, format!("via {} table '{}'", warehouse.db_type(), table))
            }
            None => (frame, "local mode (no warehouse configured)".to_string()),
        };

        let partition = ctx.store.write(self.name(), &ctx.key, &landed)?;
        Ok(StageOutcome::partition(partition).with_detail(detail))
    }
}
