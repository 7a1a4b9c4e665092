//! Validation engine and stage
//!
//! Computes a per-column data-quality report for the latest raw partition
//! without mutating it. The report is a new, separate artifact keyed by
//! `(partition_key, column)`. A report with zero OK columns is surfaced for
//! operator review but does not fail the stage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cf_core::contract::{ColumnContract, ColumnSpec, SemanticType};
use cf_core::frame::{Column, Frame, Value};
use cf_core::partition::StageName;

use crate::error::EngineResult;
use crate::stage::{Stage, StageContext, StageOutcome};

/// Status assigned to a column by the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    HighMissing,
    ConstantValue,
    UnexpectedUnique,
    Ok,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::HighMissing => write!(f, "High Missing"),
            CheckStatus::ConstantValue => write!(f, "Constant Value"),
            CheckStatus::UnexpectedUnique => write!(f, "Unexpected Unique"),
            CheckStatus::Ok => write!(f, "OK"),
        }
    }
}

/// One report row, keyed by `(partition_key, column)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub data_type: String,
    pub missing_pct: f64,
    pub unique_values: usize,
    pub is_constant: bool,
    pub is_unique: bool,
    pub most_frequent: Option<String>,
    pub status: CheckStatus,
}

/// Whether a column name reads as a row identifier and is therefore
/// exempt from the all-unique check.
pub fn looks_like_identifier(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("id") || lower.ends_with("_id")
}

/// Profile one column and assign its status.
///
/// The decision table is evaluated in priority order; the first match wins:
/// missing% > 50, then constant, then unexpectedly unique, then OK.
pub fn profile_column(column: &Column) -> ColumnProfile {
    let missing_pct = column.missing_pct();
    let unique_values = column.distinct_count();
    let is_constant = unique_values == 1;
    let is_unique = column.all_unique();

    let status = if missing_pct > 50.0 {
        CheckStatus::HighMissing
    } else if is_constant {
        CheckStatus::ConstantValue
    } else if is_unique && !looks_like_identifier(&column.name) {
        CheckStatus::UnexpectedUnique
    } else {
        CheckStatus::Ok
    };

    ColumnProfile {
        column: column.name.clone(),
        data_type: column.type_label().to_string(),
        missing_pct,
        unique_values,
        is_constant,
        is_unique,
        most_frequent: column.mode().map(|v| v.to_csv_field()),
        status,
    }
}

/// Profile every column of a frame.
pub fn profile_frame(frame: &Frame) -> Vec<ColumnProfile> {
    frame.columns().iter().map(profile_column).collect()
}

/// Render profiles as the report frame written to the validation artifact.
pub fn report_frame(profiles: &[ColumnProfile]) -> Frame {
    let mut frame = Frame::with_columns(&[
        "column",
        "data_type",
        "missing_pct",
        "unique_values",
        "is_constant",
        "is_unique",
        "most_frequent",
        "status",
    ]);
    for p in profiles {
        // push_row cannot fail: arity matches the header above
        let _ = frame.push_row(vec![
            Value::Str(p.column.clone()),
            Value::Str(p.data_type.clone()),
            Value::Float(p.missing_pct),
            Value::Int(p.unique_values as i64),
            Value::Str(p.is_constant.to_string()),
            Value::Str(p.is_unique.to_string()),
            p.most_frequent
                .clone()
                .map(Value::Str)
                .unwrap_or(Value::Null),
            Value::Str(p.status.to_string()),
        ]);
    }
    frame
}

/// Declared column expectations for the raw partition: the target must be
/// present and binary-coercible, identifiers must be present.
fn raw_contract(config: &cf_core::config::Config) -> ColumnContract {
    let mut columns = vec![ColumnSpec::new(
        config.target_column.clone(),
        SemanticType::Target,
    )];
    for name in &config.identifier_columns {
        columns.push(ColumnSpec::new(name.clone(), SemanticType::Identifier));
    }
    ColumnContract {
        stage: StageName::Ingest,
        columns,
    }
}

pub struct ValidateStage;

#[async_trait]
impl Stage for ValidateStage {
    fn name(&self) -> StageName {
        StageName::Validate
    }

    fn upstream(&self) -> Option<StageName> {
        Some(StageName::Ingest)
    }

    async fn execute(&self, ctx: &StageContext) -> EngineResult<StageOutcome> {
        let (upstream, frame) = ctx.resolve_upstream(self.name(), StageName::Ingest)?;
        let profiles = profile_frame(&frame);
        let ok_count = profiles
            .iter()
            .filter(|p| p.status == CheckStatus::Ok)
            .count();

        if ok_count == 0 && !profiles.is_empty() {
            log::warn!(
                "validation of partition {} found zero OK columns; review the report",
                upstream.key
            );
        }

        // score the declared column contract; violations are surfaced for
        // operator review, enforcement happens downstream in preparation
        let contract = raw_contract(&ctx.config);
        let contract_report = contract.check(&frame);
        for violation in &contract_report.violations {
            log::warn!("contract violation in partition {}: {}", upstream.key, violation);
        }

        let report = report_frame(&profiles);
        let partition = ctx.store.write(self.name(), &ctx.key, &report)?;
        let mut detail = format!("{}/{} columns OK", ok_count, profiles.len());
        if !contract_report.passed() {
            detail.push_str(&format!(
                ", {} contract violation(s)",
                contract_report.violations.len()
            ));
        }
        Ok(StageOutcome::partition(partition).with_detail(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: Vec<Value>) -> Column {
        Column::new(name, values)
    }

    #[test]
    fn test_high_missing_wins_over_constant() {
        // 60% missing AND constant among non-nulls: priority picks High Missing
        let col = column(
            "sparse",
            vec![
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Int(1),
                Value::Int(1),
            ],
        );
        let profile = profile_column(&col);
        assert_eq!(profile.missing_pct, 60.0);
        assert!(profile.is_constant);
        assert_eq!(profile.status, CheckStatus::HighMissing);
    }

    #[test]
    fn test_constant_value() {
        let col = column("plan", vec![Value::Str("basic".into()); 4]);
        let profile = profile_column(&col);
        assert_eq!(profile.missing_pct, 0.0);
        assert_eq!(profile.status, CheckStatus::ConstantValue);
    }

    #[test]
    fn test_identifier_exemption() {
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let id_col = column("customer_id", values.clone());
        assert_eq!(profile_column(&id_col).status, CheckStatus::Ok);

        let notes_col = column(
            "notes",
            vec![
                Value::Str("a".into()),
                Value::Str("b".into()),
                Value::Str("c".into()),
            ],
        );
        assert_eq!(profile_column(&notes_col).status, CheckStatus::UnexpectedUnique);
    }

    #[test]
    fn test_ok_column() {
        let col = column(
            "age",
            vec![Value::Int(30), Value::Int(41), Value::Int(30)],
        );
        let profile = profile_column(&col);
        assert_eq!(profile.status, CheckStatus::Ok);
        assert_eq!(profile.unique_values, 2);
        assert_eq!(profile.most_frequent, Some("30".to_string()));
    }

    #[test]
    fn test_empty_column_has_no_mode() {
        let col = column("empty", vec![Value::Null, Value::Null]);
        let profile = profile_column(&col);
        assert_eq!(profile.most_frequent, None);
        assert_eq!(profile.status, CheckStatus::HighMissing);
    }

    #[test]
    fn test_identifier_name_patterns() {
        assert!(looks_like_identifier("id"));
        assert!(looks_like_identifier("ID"));
        assert!(looks_like_identifier("customer_id"));
        assert!(looks_like_identifier("id_code"));
        assert!(!looks_like_identifier("notes"));
        assert!(!looks_like_identifier("paid"));
    }

    #[test]
    fn test_raw_contract_flags_missing_target() {
        let config: cf_core::config::Config = serde_yaml::from_str("name: t").unwrap();
        let contract = raw_contract(&config);
        let mut frame = Frame::with_columns(&["age"]);
        frame.push_row(vec![Value::Int(30)]).unwrap();
        let report = contract.check(&frame);
        assert!(!report.passed());
    }

    #[test]
    fn test_report_frame_shape() {
        let profiles = vec![profile_column(&column("age", vec![Value::Int(1), Value::Int(1)]))];
        let frame = report_frame(&profiles);
        assert_eq!(frame.n_rows(), 1);
        assert_eq!(frame.column("status").unwrap().values[0], Value::Str("Constant Value".into()));
    }
}
