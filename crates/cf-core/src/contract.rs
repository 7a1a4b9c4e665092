//! Column contracts
//!
//! A contract declares, per dataset stage, the expected columns with their
//! semantic types and optional value constraints. The validation engine
//! scores conformance; the preparation stage enforces the one hard
//! invariant, that the target column is present and coercible to a binary
//! indicator in every stage from preparation onward.

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, Value};
use crate::partition::StageName;

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Continuous or discrete numeric measure
    Numeric,
    /// Discrete labeled values
    Categorical,
    /// Row identity, exempt from uniqueness checks
    Identifier,
    /// The binary prediction target
    Target,
}

/// Expected shape of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub semantic_type: SemanticType,

    /// Inclusive valid range for numeric columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,

    /// Allowed values for categorical columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            range: None,
            categories: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }
}

/// Declared column expectations for one stage's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnContract {
    pub stage: StageName,
    pub columns: Vec<ColumnSpec>,
}

/// One contract violation found while checking a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContractViolation {
    /// Expected column not found in the frame
    MissingColumn { column: String },
    /// Target column present but not coercible to a binary indicator
    TargetNotBinary { column: String, sample: String },
    /// Numeric values outside the declared range
    OutOfRange { column: String, count: usize },
    /// Categorical values outside the declared category set
    UnknownCategory { column: String, count: usize },
}

impl std::fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractViolation::MissingColumn { column } => {
                write!(f, "expected column '{}' is missing", column)
            }
            ContractViolation::TargetNotBinary { column, sample } => {
                write!(
                    f,
                    "target column '{}' is not binary-coercible (e.g. {:?})",
                    column, sample
                )
            }
            ContractViolation::OutOfRange { column, count } => {
                write!(f, "column '{}' has {} out-of-range values", column, count)
            }
            ContractViolation::UnknownCategory { column, count } => {
                write!(f, "column '{}' has {} unknown categories", column, count)
            }
        }
    }
}

/// Result of checking a frame against a contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractReport {
    pub violations: Vec<ContractViolation>,
}

impl ContractReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

impl ColumnContract {
    /// Check a frame against this contract without mutating it.
    pub fn check(&self, frame: &Frame) -> ContractReport {
        let mut report = ContractReport::default();
        for spec in &self.columns {
            let Some(column) = frame.column(&spec.name) else {
                report.violations.push(ContractViolation::MissingColumn {
                    column: spec.name.clone(),
                });
                continue;
            };
            match spec.semantic_type {
                SemanticType::Target => {
                    if let Some(bad) = column
                        .values
                        .iter()
                        .find(|v| !v.is_null() && binary_value(v).is_none())
                    {
                        report.violations.push(ContractViolation::TargetNotBinary {
                            column: spec.name.clone(),
                            sample: bad.to_csv_field(),
                        });
                    }
                }
                SemanticType::Numeric => {
                    if let Some((min, max)) = spec.range {
                        let count = column
                            .values
                            .iter()
                            .filter_map(|v| v.as_f64())
                            .filter(|x| *x < min || *x > max)
                            .count();
                        if count > 0 {
                            report.violations.push(ContractViolation::OutOfRange {
                                column: spec.name.clone(),
                                count,
                            });
                        }
                    }
                }
                SemanticType::Categorical => {
                    if let Some(categories) = &spec.categories {
                        let count = column
                            .values
                            .iter()
                            .filter(|v| !v.is_null())
                            .filter(|v| !categories.iter().any(|c| c == &v.to_csv_field()))
                            .count();
                        if count > 0 {
                            report.violations.push(ContractViolation::UnknownCategory {
                                column: spec.name.clone(),
                                count,
                            });
                        }
                    }
                }
                SemanticType::Identifier => {}
            }
        }
        report
    }
}

/// Interpret a value as a binary indicator.
///
/// Accepts 0/1 integers and floats, and the usual textual spellings.
/// Returns `None` when the value has no binary reading.
pub fn binary_value(value: &Value) -> Option<i64> {
    match value {
        Value::Int(0) => Some(0),
        Value::Int(1) => Some(1),
        Value::Float(f) if *f == 0.0 => Some(0),
        Value::Float(f) if *f == 1.0 => Some(1),
        Value::Str(s) => match s.trim().to_lowercase().as_str() {
            "0" | "no" | "false" | "n" => Some(0),
            "1" | "yes" | "true" | "y" => Some(1),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_target(values: Vec<Value>) -> Frame {
        let mut frame = Frame::with_columns(&["churn"]);
        for v in values {
            frame.push_row(vec![v]).unwrap();
        }
        frame
    }

    fn target_contract() -> ColumnContract {
        ColumnContract {
            stage: StageName::Prepare,
            columns: vec![ColumnSpec::new("churn", SemanticType::Target)],
        }
    }

    #[test]
    fn test_binary_values() {
        assert_eq!(binary_value(&Value::Int(0)), Some(0));
        assert_eq!(binary_value(&Value::Int(1)), Some(1));
        assert_eq!(binary_value(&Value::Float(1.0)), Some(1));
        assert_eq!(binary_value(&Value::Str("Yes".into())), Some(1));
        assert_eq!(binary_value(&Value::Str("no".into())), Some(0));
        assert_eq!(binary_value(&Value::Int(2)), None);
        assert_eq!(binary_value(&Value::Str("maybe".into())), None);
        assert_eq!(binary_value(&Value::Null), None);
    }

    #[test]
    fn test_target_contract_passes_on_binary() {
        let frame = frame_with_target(vec![Value::Int(0), Value::Int(1), Value::Str("yes".into())]);
        assert!(target_contract().check(&frame).passed());
    }

    #[test]
    fn test_target_contract_fails_on_non_binary() {
        let frame = frame_with_target(vec![Value::Int(0), Value::Int(3)]);
        let report = target_contract().check(&frame);
        assert!(!report.passed());
        assert!(matches!(
            report.violations[0],
            ContractViolation::TargetNotBinary { .. }
        ));
    }

    #[test]
    fn test_missing_target_reported() {
        let frame = Frame::with_columns(&["age"]);
        let report = target_contract().check(&frame);
        assert_eq!(
            report.violations,
            vec![ContractViolation::MissingColumn {
                column: "churn".into()
            }]
        );
    }

    #[test]
    fn test_numeric_range() {
        let mut frame = Frame::with_columns(&["age"]);
        frame.push_row(vec![Value::Int(25)]).unwrap();
        frame.push_row(vec![Value::Int(130)]).unwrap();
        let contract = ColumnContract {
            stage: StageName::Ingest,
            columns: vec![ColumnSpec::new("age", SemanticType::Numeric).with_range(0.0, 120.0)],
        };
        let report = contract.check(&frame);
        assert_eq!(
            report.violations,
            vec![ContractViolation::OutOfRange {
                column: "age".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_category_set() {
        let mut frame = Frame::with_columns(&["gender"]);
        frame.push_row(vec![Value::Str("M".into())]).unwrap();
        frame.push_row(vec![Value::Str("X".into())]).unwrap();
        let contract = ColumnContract {
            stage: StageName::Ingest,
            columns: vec![ColumnSpec::new("gender", SemanticType::Categorical)
                .with_categories(vec!["M".into(), "F".into()])],
        };
        let report = contract.check(&frame);
        assert_eq!(
            report.violations,
            vec![ContractViolation::UnknownCategory {
                column: "gender".into(),
                count: 1
            }]
        );
    }
}
