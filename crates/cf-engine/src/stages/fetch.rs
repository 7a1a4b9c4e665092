//! Fetch stage: pull raw rows from the configured source
//!
//! Transport failures abort the fetch and the landing partition is not
//! written, so a dependent ingest can never observe a half-fetched batch.

use async_trait::async_trait;

use cf_core::partition::StageName;

use crate::error::{EngineError, EngineResult};
use crate::stage::{Stage, StageContext, StageOutcome};

pub struct FetchStage;

#[async_trait]
impl Stage for FetchStage {
    fn name(&self) -> StageName {
        StageName::Fetch
    }

    fn upstream(&self) -> Option<StageName> {
        None
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let Some(source) = &ctx.source else {
            return Err(EngineError::Processing {
                stage: self.name().to_string(),
                message: "no fetch source configured (set `fetch:` in churnflow.yml)".to_string(),
            });
        };

        let page_size = ctx
            .config
            .fetch
            .as_ref()
            .map(|f| f.page_size)
            .unwrap_or(100);

        log::info!("starting download from {}", source.describe());
        let frame = cf_source::fetch_all(source.as_ref(), page_size)
            .await
            .map_err(|e| EngineError::ExternalService {
                stage: self.name().to_string(),
                message: e.to_string(),
            })?;

        if frame.n_rows() == 0 {
            return Err(EngineError::Processing {
                stage: self.name().to_string(),
                message: format!("source {} returned no rows", source.describe()),
            });
        }

        let partition = ctx.store.write(self.name(), &ctx.key, &frame)?;
        Ok(StageOutcome::partition(partition))
    }
}
