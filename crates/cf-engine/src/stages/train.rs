//! Training stage: encode features, fit, evaluate, hand off
//!
//! Builds a numeric design matrix from the transformed partition
//! (identifiers and the target excluded, categoricals one-hot encoded with
//! the first level dropped), then fits the configured trainer on a
//! deterministic 80/20 split and writes the model artifact and its
//! evaluation metrics for the external model registry.

use async_trait::async_trait;
use std::collections::BTreeSet;

use cf_core::contract::binary_value;
use cf_core::frame::Frame;
use cf_core::partition::{PartitionRef, StageName};

use crate::error::{EngineError, EngineResult};
use crate::metrics::EvalMetrics;
use crate::model::ModelTrainer;
use crate::stage::{Stage, StageContext, StageOutcome};
use crate::stages::validate::looks_like_identifier;

pub struct TrainStage {
    trainer: Box<dyn ModelTrainer>,
}

impl TrainStage {
    pub fn new(trainer: Box<dyn ModelTrainer>) -> Self {
        Self { trainer }
    }
}

/// Numeric design matrix with feature names in column order.
#[derive(Debug)]
pub struct DesignMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
}

/// Encode a transformed frame into a design matrix.
///
/// Numeric columns pass through (remaining nulls fall back to the column
/// median); non-numeric columns are one-hot encoded over their sorted
/// distinct values with the first level dropped.
pub fn encode_design_matrix(
    frame: &Frame,
    target: &str,
    is_identifier: impl Fn(&str) -> bool,
    stage: StageName,
) -> EngineResult<DesignMatrix> {
    let n = frame.n_rows();

    let target_column = frame.column(target).ok_or_else(|| EngineError::Processing {
        stage: stage.to_string(),
        message: format!("target column '{}' is missing", target),
    })?;
    let mut labels = Vec::with_capacity(n);
    for value in &target_column.values {
        let bit = binary_value(value).ok_or_else(|| EngineError::Processing {
            stage: stage.to_string(),
            message: format!(
                "target column '{}' is not binary (value {:?})",
                target,
                value.to_csv_field()
            ),
        })?;
        labels.push(bit);
    }

    let mut feature_names = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for column in frame.columns() {
        if column.name == target || is_identifier(&column.name) {
            continue;
        }
        if column.is_numeric() {
            let fallback = column.median().unwrap_or(0.0);
            feature_names.push(column.name.clone());
            columns.push(
                column
                    .values
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(fallback))
                    .collect(),
            );
        } else {
            // one-hot over sorted levels, first level dropped
            let levels: BTreeSet<String> = column
                .values
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| v.to_csv_field())
                .collect();
            for level in levels.iter().skip(1) {
                feature_names.push(format!("{}__{}", column.name, level));
                columns.push(
                    column
                        .values
                        .iter()
                        .map(|v| {
                            if !v.is_null() && &v.to_csv_field() == level {
                                1.0
                            } else {
                                0.0
                            }
                        })
                        .collect(),
                );
            }
        }
    }

    if feature_names.is_empty() {
        return Err(EngineError::Processing {
            stage: stage.to_string(),
            message: "no usable feature columns after excluding identifiers and the target"
                .to_string(),
        });
    }

    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| columns.iter().map(|c| c[i]).collect())
        .collect();

    Ok(DesignMatrix {
        feature_names,
        rows,
        labels,
    })
}

/// Deterministic 80/20 split: every fifth row goes to the holdout.
pub fn split_indices(n: usize) -> (Vec<usize>, Vec<usize>) {
    let mut train = Vec::new();
    let mut test = Vec::new();
    for i in 0..n {
        if i % 5 == 0 {
            test.push(i);
        } else {
            train.push(i);
        }
    }
    (train, test)
}

#[async_trait]
impl Stage for TrainStage {
    fn name(&self) -> StageName {
        StageName::Train
    }

    fn upstream(&self) -> Option<StageName> {
        Some(StageName::Transform)
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let (_, frame) = ctx.resolve_upstream(self.name(), StageName::Transform)?;

        let matrix = encode_design_matrix(
            &frame,
            &ctx.config.target_column,
            |name| ctx.config.is_identifier_column(name) || looks_like_identifier(name),
            self.name(),
        )?;

        let (train_idx, test_idx) = split_indices(matrix.rows.len());
        if train_idx.is_empty() {
            return Err(EngineError::Processing {
                stage: self.name().to_string(),
                message: format!(
                    "{} row(s) is not enough to split into train and holdout sets",
                    matrix.rows.len()
                ),
            });
        }
        let take = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<i64>) {
            (
                idx.iter().map(|i| matrix.rows[*i].clone()).collect(),
                idx.iter().map(|i| matrix.labels[*i]).collect(),
            )
        };
        let (x_train, y_train) = take(&train_idx);
        let (x_test, y_test) = take(&test_idx);

        log::info!(
            "training {} on {} rows, {} features ({} holdout rows)",
            self.trainer.name(),
            x_train.len(),
            matrix.feature_names.len(),
            x_test.len()
        );
        let model = self.trainer.fit(&x_train, &y_train, &matrix.feature_names)?;
        let metrics = model.evaluate(&x_test, &y_test);
        log::info!("model evaluation: {}", metrics);

        let partition = write_model_artifacts(ctx, &model.serialize()?, &metrics)?;
        Ok(StageOutcome {
            partition: Some(partition),
            rows: Some(matrix.rows.len()),
            detail: Some(metrics.to_string()),
        })
    }
}

/// Write metrics first, then the model artifact: the model file doubles as
/// the partition's completion marker for `resolve_latest`.
fn write_model_artifacts(
    ctx: &StageContext,
    model_json: &str,
    metrics: &EvalMetrics,
) -> EngineResult<PartitionRef> {
    let dir = ctx.store.partition_dir(StageName::Train, &ctx.key);
    std::fs::create_dir_all(&dir).map_err(|e| cf_core::error::CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let metrics_path = dir.join("metrics.json");
    let metrics_json =
        serde_json::to_string_pretty(metrics).map_err(cf_core::error::CoreError::from)?;
    std::fs::write(&metrics_path, metrics_json).map_err(|e| {
        cf_core::error::CoreError::IoWithPath {
            path: metrics_path.display().to_string(),
            source: e,
        }
    })?;

    let model_path = ctx.store.artifact_path(StageName::Train, &ctx.key);
    std::fs::write(&model_path, model_json).map_err(|e| {
        cf_core::error::CoreError::IoWithPath {
            path: model_path.display().to_string(),
            source: e,
        }
    })?;

    Ok(PartitionRef {
        stage: StageName::Train,
        key: ctx.key.clone(),
        path: model_path,
        row_count: None,
        created_at: Some(chrono::Utc::now()),
    })
}
