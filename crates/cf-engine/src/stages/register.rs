//! Feature registration stage
//!
//! Appends one ledger record per derived feature present in the latest
//! transformed partition. The ledger is append-only: each run adds rows,
//! never rewrites them, so the registry stays a complete history of every
//! feature ever produced.

use async_trait::async_trait;
use chrono::Utc;

use cf_core::partition::StageName;
use cf_core::registry::{FeatureRecord, FeatureRegistry};

use crate::derive::builtin_derivations;
use crate::error::EngineResult;
use crate::stage::{Stage, StageContext, StageOutcome};

pub struct RegisterFeaturesStage;

#[async_trait]
impl Stage for RegisterFeaturesStage {
    fn name(&self) -> StageName {
        StageName::RegisterFeatures
    }

    fn upstream(&self) -> Option<StageName> {
        Some(StageName::Transform)
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let (upstream, frame) = ctx.resolve_upstream(self.name(), StageName::Transform)?;

        let batch: Vec<FeatureRecord> = builtin_derivations()
            .into_iter()
            .filter(|d| frame.has_column(&d.output))
            .map(|d| FeatureRecord {
                name: d.output,
                description: d.description,
                version: ctx.config.feature_version.clone(),
                source_partition: upstream.key.clone(),
                created_at: Utc::now(),
            })
            .collect();

        let registry = FeatureRegistry::new(ctx.store.metadata_dir());
        let total = registry.register(&batch, &ctx.key)?;

        Ok(StageOutcome {
            partition: None,
            rows: Some(batch.len()),
            detail: Some(format!(
                "registered {} feature(s); ledger has {} record(s)",
                batch.len(),
                total
            )),
        })
    }
}
