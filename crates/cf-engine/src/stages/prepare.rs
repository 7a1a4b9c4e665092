//! Preparation stage: dedup, impute, and coerce the target
//!
//! Drops exact duplicate rows, fills numeric nulls with the column median
//! and categorical nulls with the column mode, then coerces the target
//! column to a 0/1 indicator. From this stage onward the target being
//! present and binary is an invariant; data that breaks it is a
//! `Processing` failure, not something to silently patch over.

use async_trait::async_trait;

use cf_core::contract::binary_value;
use cf_core::frame::{Frame, Value};
use cf_core::partition::StageName;

use crate::error::{EngineError, EngineResult};
use crate::stage::{Stage, StageContext, StageOutcome};

pub struct PrepareStage;

/// Fill nulls in place: median for numeric columns, mode for the rest.
/// Columns that are entirely null are left untouched.
fn impute_missing(frame: &mut Frame) -> Vec<String> {
    let mut imputed = Vec::new();
    let names: Vec<String> = frame.column_names().iter().map(|s| s.to_string()).collect();
    for name in names {
        let column = match frame.column(&name) {
            Some(c) if c.null_count() > 0 => c,
            _ => continue,
        };
        let fill = if column.is_numeric() {
            column.median().map(Value::Float)
        } else {
            column.mode()
        };
        let Some(fill) = fill else {
            continue;
        };
        let values: Vec<Value> = column
            .values
            .iter()
            .map(|v| if v.is_null() { fill.clone() } else { v.clone() })
            .collect();
        // set_column cannot fail: name and length both come from the frame
        let _ = frame.set_column(&name, values);
        imputed.push(name);
    }
    imputed
}

/// Rewrite the target column as 0/1 integers.
fn coerce_target(frame: &mut Frame, target: &str, stage: StageName) -> EngineResult<()> {
    let column = frame
        .column(target)
        .ok_or_else(|| EngineError::Processing {
            stage: stage.to_string(),
            message: format!("target column '{}' is missing", target),
        })?;
    let mut coerced = Vec::with_capacity(column.len());
    for value in &column.values {
        match binary_value(value) {
            Some(bit) => coerced.push(Value::Int(bit)),
            None => {
                return Err(EngineError::Processing {
                    stage: stage.to_string(),
                    message: format!(
                        "target column '{}' is not coercible to a binary indicator (value {:?})",
                        target,
                        value.to_csv_field()
                    ),
                });
            }
        }
    }
    let _ = frame.set_column(target, coerced);
    Ok(())
}

#[async_trait]
impl Stage for PrepareStage {
    fn name(&self) -> StageName {
        StageName::Prepare
    }

    fn upstream(&self) -> Option<StageName> {
        Some(StageName::Ingest)
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let (_, mut frame) = ctx.resolve_upstream(self.name(), StageName::Ingest)?;
        let before = frame.n_rows();

        let removed = frame.dedup_rows();
        let imputed = impute_missing(&mut frame);
        coerce_target(&mut frame, &ctx.config.target_column, self.name())?;

        log::info!(
            "prepared data: {} -> {} rows, {} duplicate(s) removed, {} column(s) imputed",
            before,
            frame.n_rows(),
            removed,
            imputed.len()
        );

        let partition = ctx.store.write(self.name(), &ctx.key, &frame)?;
        Ok(StageOutcome::partition(partition).with_detail(format!(
            "{} duplicates removed, imputed: {}",
            removed,
            if imputed.is_empty() {
                "none".to_string()
            } else {
                imputed.join(", ")
            }
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impute_numeric_with_median() {
        let mut frame = Frame::with_columns(&["x"]);
        for v in [Value::Int(1), Value::Null, Value::Int(3), Value::Int(5)] {
            frame.push_row(vec![v]).unwrap();
        }
        let imputed = impute_missing(&mut frame);
        assert_eq!(imputed, vec!["x".to_string()]);
        assert_eq!(frame.column("x").unwrap().values[1], Value::Float(3.0));
    }

    #[test]
    fn test_impute_categorical_with_mode() {
        let mut frame = Frame::with_columns(&["plan"]);
        for v in [
            Value::Str("basic".into()),
            Value::Str("basic".into()),
            Value::Null,
            Value::Str("pro".into()),
        ] {
            frame.push_row(vec![v]).unwrap();
        }
        impute_missing(&mut frame);
        assert_eq!(
            frame.column("plan").unwrap().values[2],
            Value::Str("basic".into())
        );
    }

    #[test]
    fn test_all_null_column_left_alone() {
        let mut frame = Frame::with_columns(&["ghost"]);
        frame.push_row(vec![Value::Null]).unwrap();
        let imputed = impute_missing(&mut frame);
        assert!(imputed.is_empty());
        assert_eq!(frame.column("ghost").unwrap().values[0], Value::Null);
    }

    #[test]
    fn test_coerce_target_accepts_textual_binary() {
        let mut frame = Frame::with_columns(&["churn"]);
        for v in [Value::Str("Yes".into()), Value::Str("no".into()), Value::Int(1)] {
            frame.push_row(vec![v]).unwrap();
        }
        coerce_target(&mut frame, "churn", StageName::Prepare).unwrap();
        assert_eq!(
            frame.column("churn").unwrap().values,
            vec![Value::Int(1), Value::Int(0), Value::Int(1)]
        );
    }

    #[test]
    fn test_coerce_target_rejects_non_binary() {
        let mut frame = Frame::with_columns(&["churn"]);
        frame.push_row(vec![Value::Int(2)]).unwrap();
        let err = coerce_target(&mut frame, "churn", StageName::Prepare).unwrap_err();
        assert!(matches!(err, EngineError::Processing { .. }));
    }

    #[test]
    fn test_coerce_target_missing_column() {
        let mut frame = Frame::with_columns(&["age"]);
        frame.push_row(vec![Value::Int(30)]).unwrap();
        let err = coerce_target(&mut frame, "churn", StageName::Prepare).unwrap_err();
        assert!(matches!(err, EngineError::Processing { .. }));
    }
}
