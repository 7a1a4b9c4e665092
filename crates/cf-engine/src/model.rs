//! Model trainer contract and the logistic-regression baseline
//!
//! The statistical model is an external collaborator behind a
//! fit / evaluate / serialize contract. The baseline is a standardized
//! logistic regression trained by batch gradient descent: deterministic,
//! dependency-free, and good enough to exercise the full handoff.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::metrics::EvalMetrics;

/// A trained binary classifier ready for handoff to a model registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Trainer that produced the model
    pub trainer: String,

    /// Feature names in weight order
    pub feature_names: Vec<String>,

    /// Per-feature standardization means
    pub means: Vec<f64>,

    /// Per-feature standardization deviations (zero replaced with one)
    pub stds: Vec<f64>,

    /// Learned weights, one per feature
    pub weights: Vec<f64>,

    /// Learned intercept
    pub bias: f64,
}

impl TrainedModel {
    /// Predict the binary label for one raw (unstandardized) feature row.
    pub fn predict(&self, features: &[f64]) -> i64 {
        let mut z = self.bias;
        for ((x, mean), (std, w)) in features
            .iter()
            .zip(&self.means)
            .zip(self.stds.iter().zip(&self.weights))
        {
            z += (x - mean) / std * w;
        }
        i64::from(sigmoid(z) >= 0.5)
    }

    /// Evaluate the model on a labeled feature matrix.
    pub fn evaluate(&self, rows: &[Vec<f64>], labels: &[i64]) -> EvalMetrics {
        let predictions: Vec<i64> = rows.iter().map(|r| self.predict(r)).collect();
        EvalMetrics::from_predictions(labels, &predictions)
    }

    /// Serialize the model artifact as pretty JSON.
    pub fn serialize(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Processing {
            stage: "train".to_string(),
            message: format!("failed to serialize model: {}", e),
        })
    }
}

/// Fit / evaluate / serialize contract for swappable model backends.
pub trait ModelTrainer: Send + Sync {
    /// Trainer name recorded in the model artifact.
    fn name(&self) -> &'static str;

    /// Fit a model on a raw feature matrix and binary labels.
    fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[i64],
        feature_names: &[String],
    ) -> EngineResult<TrainedModel>;
}

/// Standardized logistic regression trained by batch gradient descent.
pub struct LogisticRegressionTrainer {
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for LogisticRegressionTrainer {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 0.1,
        }
    }
}

impl ModelTrainer for LogisticRegressionTrainer {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn fit(
        &self,
        rows: &[Vec<f64>],
        labels: &[i64],
        feature_names: &[String],
    ) -> EngineResult<TrainedModel> {
        let n = rows.len();
        let d = feature_names.len();
        if n == 0 || d == 0 {
            return Err(EngineError::Processing {
                stage: "train".to_string(),
                message: "cannot fit a model on an empty feature matrix".to_string(),
            });
        }
        if labels.len() != n {
            return Err(EngineError::Processing {
                stage: "train".to_string(),
                message: format!("{} rows but {} labels", n, labels.len()),
            });
        }

        let (means, stds) = standardization(rows, d);
        let standardized: Vec<Vec<f64>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(means.iter().zip(&stds))
                    .map(|(x, (mean, std))| (x - mean) / std)
                    .collect()
            })
            .collect();

        let mut weights = vec![0.0; d];
        let mut bias = 0.0;
        for _ in 0..self.epochs {
            let mut grad_w = vec![0.0; d];
            let mut grad_b = 0.0;
            for (row, label) in standardized.iter().zip(labels) {
                let z = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>();
                let err = sigmoid(z) - *label as f64;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_b += err;
            }
            let scale = self.learning_rate / n as f64;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= scale * g;
            }
            bias -= scale * grad_b;
        }

        Ok(TrainedModel {
            trainer: self.name().to_string(),
            feature_names: feature_names.to_vec(),
            means,
            stds,
            weights,
            bias,
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Column means and deviations; a zero deviation is replaced with one so
/// constant features standardize to zero instead of dividing by zero.
fn standardization(rows: &[Vec<f64>], d: usize) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len() as f64;
    let mut means = vec![0.0; d];
    for row in rows {
        for (m, x) in means.iter_mut().zip(row) {
            *m += x;
        }
    }
    for m in &mut means {
        *m /= n;
    }
    let mut vars = vec![0.0; d];
    for row in rows {
        for ((v, x), m) in vars.iter_mut().zip(row).zip(&means) {
            *v += (x - m) * (x - m);
        }
    }
    let stds = vars
        .into_iter()
        .map(|v| {
            let s = (v / n).sqrt();
            if s == 0.0 {
                1.0
            } else {
                s
            }
        })
        .collect();
    (means, stds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_separable_data() {
        // label 1 iff x > 5: linearly separable in one dimension
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let labels: Vec<i64> = (0..10).map(|i| i64::from(i > 5)).collect();
        let trainer = LogisticRegressionTrainer::default();
        let model = trainer.fit(&rows, &labels, &names(&["x"])).unwrap();

        let metrics = model.evaluate(&rows, &labels);
        assert!(metrics.accuracy >= 0.8, "accuracy was {}", metrics.accuracy);
        assert!(model.weights[0] > 0.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 1.0], vec![2.0, 2.0]];
        let labels = vec![0, 1, 0];
        let trainer = LogisticRegressionTrainer::default();
        let a = trainer.fit(&rows, &labels, &names(&["x", "y"])).unwrap();
        let b = trainer.fit(&rows, &labels, &names(&["x", "y"])).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn test_constant_feature_does_not_divide_by_zero() {
        let rows = vec![vec![1.0], vec![1.0], vec![1.0]];
        let labels = vec![0, 1, 0];
        let trainer = LogisticRegressionTrainer::default();
        let model = trainer.fit(&rows, &labels, &names(&["c"])).unwrap();
        assert!(model.weights[0].is_finite());
        assert_eq!(model.stds[0], 1.0);
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let trainer = LogisticRegressionTrainer::default();
        assert!(trainer.fit(&[], &[], &names(&["x"])).is_err());
    }

    #[test]
    fn test_serialize_round_trip() {
        let trainer = LogisticRegressionTrainer::default();
        let model = trainer
            .fit(&[vec![0.0], vec![1.0]], &[0, 1], &names(&["x"]))
            .unwrap();
        let json = model.serialize().unwrap();
        let parsed: TrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.feature_names, model.feature_names);
        assert_eq!(parsed.weights, model.weights);
    }
}
