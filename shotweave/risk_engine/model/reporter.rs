use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::features::FEATURE_COUNT;

/// Outcome of fitting the overrun model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// L2 penalty.
    pub alpha: f64,
    /// Coefficients in feature order.
    pub coefficients: [f64; FEATURE_COUNT],
    /// Intercept.
    pub intercept: f64,
    /// Residual sum of squares on the training rows.
    pub rss: f64,
    /// RSS of always predicting the mean label.
    pub baseline_rss: f64,
    /// Rows fitted.
    pub samples: usize,
}

impl TrainingReport {
    /// Whether the fit explains more than the intercept-only baseline.
    #[must_use]
    pub fn beats_baseline(&self) -> bool {
        self.rss < self.baseline_rss
    }

    /// Renders a concise summary string.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "[risk] ridge alpha={} samples={} rss={:.4} baseline_rss={:.4} intercept={:.4} coefficients={:?}",
            self.alpha, self.samples, self.rss, self.baseline_rss, self.intercept, self.coefficients
        )
    }
}

/// Σ (prediction - label)².
#[must_use]
pub fn residual_sum_of_squares(predictions: &Array1<f64>, labels: &Array1<f64>) -> f64 {
    if predictions.len() != labels.len() {
        return f64::INFINITY;
    }
    (predictions - labels).mapv(|residual| residual * residual).sum()
}

/// RSS of the intercept-only model.
#[must_use]
pub fn baseline_rss(labels: &Array1<f64>) -> f64 {
    labels.mean().map_or(0.0, |mean| {
        labels.mapv(|label| (label - mean) * (label - mean)).sum()
    })
}
