//! Classification evaluation metrics

use serde::{Deserialize, Serialize};

/// Evaluation metric set handed off with a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl EvalMetrics {
    /// Compute metrics from true and predicted binary labels.
    ///
    /// Positive class is 1. Undefined ratios (no predicted positives, no
    /// actual positives) are reported as 0.0 rather than NaN.
    pub fn from_predictions(y_true: &[i64], y_pred: &[i64]) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut tn = 0usize;
        let mut fnc = 0usize;
        for (t, p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (0, 0) => tn += 1,
                (1, 0) => fnc += 1,
                _ => {}
            }
        }
        let total = tp + fp + tn + fnc;
        let accuracy = ratio(tp + tn, total);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fnc);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            accuracy,
            precision,
            recall,
            f1,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl std::fmt::Display for EvalMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "accuracy={:.3} precision={:.3} recall={:.3} f1={:.3}",
            self.accuracy, self.precision, self.recall, self.f1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 1, 1, 0];
        let metrics = EvalMetrics::from_predictions(&y, &y);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
        assert_eq!(metrics.f1, 1.0);
    }

    #[test]
    fn test_mixed_predictions() {
        let y_true = [1, 1, 0, 0];
        let y_pred = [1, 0, 1, 0];
        let metrics = EvalMetrics::from_predictions(&y_true, &y_pred);
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert_eq!(metrics.f1, 0.5);
    }

    #[test]
    fn test_undefined_ratios_are_zero() {
        // no positives anywhere: precision/recall/f1 degrade to 0, not NaN
        let metrics = EvalMetrics::from_predictions(&[0, 0], &[0, 0]);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1, 0.0);
    }
}
