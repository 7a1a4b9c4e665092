//! Transformation stage: drop leakage, derive features
//!
//! Leakage columns are dropped unconditionally before derivation
//! (tolerant of absent columns), then every applicable built-in derivation
//! adds its output column. Derivations are order-independent and skip
//! silently when their inputs are not present.

use async_trait::async_trait;

use cf_core::partition::StageName;

use crate::derive::builtin_derivations;
use crate::error::EngineResult;
use crate::stage::{Stage, StageContext, StageOutcome};

pub struct TransformStage;

#[async_trait]
impl Stage for TransformStage {
    fn name(&self) -> StageName {
        StageName::Transform
    }

    fn upstream(&self) -> Option<StageName> {
        Some(StageName::Prepare)
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let (_, mut frame) = ctx.resolve_upstream(self.name(), StageName::Prepare)?;

        let dropped = frame.drop_columns(&ctx.config.leakage_columns);
        if !dropped.is_empty() {
            log::info!("dropped leakage column(s): {}", dropped.join(", "));
        }

        let mut derived = Vec::new();
        for derivation in builtin_derivations() {
            if frame.has_column(&derivation.output) {
                log::warn!(
                    "derived column '{}' already present; keeping existing values",
                    derivation.output
                );
                continue;
            }
            if !derivation.applicable(&frame) {
                continue;
            }
            let values = derivation.apply(&frame)?;
            frame.add_column(derivation.output.clone(), values)?;
            derived.push(derivation.output);
        }
        log::info!(
            "derived {} feature column(s): {}",
            derived.len(),
            derived.join(", ")
        );

        let partition = ctx.store.write(self.name(), &ctx.key, &frame)?;
        Ok(StageOutcome::partition(partition).with_detail(format!(
            "derived: {}; dropped: {}",
            if derived.is_empty() {
                "none".to_string()
            } else {
                derived.join(", ")
            },
            if dropped.is_empty() {
                "none".to_string()
            } else {
                dropped.join(", ")
            }
        )))
    }
}
