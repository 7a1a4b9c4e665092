//! Deterministic column derivations
//!
//! Each derivation declares its output column, the input columns it reads,
//! and its formula. Derivations are order-independent and tolerant: one
//! whose inputs are absent from the frame is skipped. Any division
//! substitutes a safe default for a zero denominator so a bad row can never
//! poison downstream model training with a non-finite value.

use cf_core::error::CoreResult;
use cf_core::frame::{Frame, Value};

/// A derivation formula over named input columns.
#[derive(Debug, Clone)]
pub enum Formula {
    /// `input / divisor`
    DivideBy { input: String, divisor: f64 },
    /// `numerator / (denominator + offset)`, zero denominator becomes
    /// `zero_default`
    Ratio {
        numerator: String,
        denominator: String,
        offset: f64,
        zero_default: f64,
    },
    /// 1 when `input < threshold`, else 0
    FlagBelow { input: String, threshold: f64 },
    /// `left * right`
    Product { left: String, right: String },
}

/// One declared feature derivation.
#[derive(Debug, Clone)]
pub struct Derivation {
    /// Output column name
    pub output: String,

    /// Formula over the input columns
    pub formula: Formula,

    /// Human-readable description registered with the feature ledger
    pub description: String,
}

impl Derivation {
    /// Input column names the formula reads.
    pub fn inputs(&self) -> Vec<&str> {
        match &self.formula {
            Formula::DivideBy { input, .. } => vec![input],
            Formula::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator, denominator],
            Formula::FlagBelow { input, .. } => vec![input],
            Formula::Product { left, right } => vec![left, right],
        }
    }

    /// Whether all input columns are present and numeric in the frame.
    pub fn applicable(&self, frame: &Frame) -> bool {
        self.inputs()
            .iter()
            .all(|name| frame.column(name).map(|c| c.is_numeric()).unwrap_or(false))
    }

    /// Compute the output column. Null inputs yield null outputs.
    pub fn apply(&self, frame: &Frame) -> CoreResult<Vec<Value>> {
        let n = frame.n_rows();
        let mut out = Vec::with_capacity(n);
        match &self.formula {
            Formula::DivideBy { input, divisor } => {
                let col = frame.require_column(input)?;
                for v in &col.values {
                    out.push(match v.as_f64() {
                        Some(x) => Value::Float(x / divisor),
                        None => Value::Null,
                    });
                }
            }
            Formula::Ratio {
                numerator,
                denominator,
                offset,
                zero_default,
            } => {
                let num = frame.require_column(numerator)?;
                let den = frame.require_column(denominator)?;
                for (nv, dv) in num.values.iter().zip(&den.values) {
                    out.push(match (nv.as_f64(), dv.as_f64()) {
                        (Some(n), Some(d)) => {
                            let mut divisor = d + offset;
                            if divisor == 0.0 {
                                divisor = *zero_default;
                            }
                            Value::Float(n / divisor)
                        }
                        _ => Value::Null,
                    });
                }
            }
            Formula::FlagBelow { input, threshold } => {
                let col = frame.require_column(input)?;
                for v in &col.values {
                    out.push(match v.as_f64() {
                        Some(x) => Value::Int(i64::from(x < *threshold)),
                        None => Value::Null,
                    });
                }
            }
            Formula::Product { left, right } => {
                let l = frame.require_column(left)?;
                let r = frame.require_column(right)?;
                for (lv, rv) in l.values.iter().zip(&r.values) {
                    out.push(match (lv.as_f64(), rv.as_f64()) {
                        (Some(a), Some(b)) => Value::Float(a * b),
                        _ => Value::Null,
                    });
                }
            }
        }
        Ok(out)
    }
}

/// The built-in derivation set.
pub fn builtin_derivations() -> Vec<Derivation> {
    vec![
        Derivation {
            output: "tenure_years".to_string(),
            formula: Formula::DivideBy {
                input: "tenure_months".to_string(),
                divisor: 12.0,
            },
            description: "Tenure in years = tenure_months / 12".to_string(),
        },
        Derivation {
            output: "activity_rate".to_string(),
            formula: Formula::Ratio {
                numerator: "num_logins".to_string(),
                denominator: "tenure_months".to_string(),
                offset: 1.0,
                zero_default: 1.0,
            },
            description: "Login activity rate = num_logins / (tenure_months + 1)".to_string(),
        },
        Derivation {
            output: "recent_active".to_string(),
            formula: Formula::FlagBelow {
                input: "last_login_days".to_string(),
                threshold: 30.0,
            },
            description: "1 when the last login was under 30 days ago".to_string(),
        },
        Derivation {
            output: "avg_spend_per_login".to_string(),
            formula: Formula::Ratio {
                numerator: "monthly_spend".to_string(),
                denominator: "num_logins".to_string(),
                offset: 0.0,
                zero_default: 1.0,
            },
            description: "Average spend per login = monthly_spend / num_logins (zero logins count as one)"
                .to_string(),
        },
    ]
}
