//! Overrun regression: fixed training table, ridge fit, persistence.

/// Embedded training table.
pub mod dataset;
/// Operational feature vector.
pub mod features;
/// Fit reports and residual metrics.
pub mod reporter;
/// Ridge solver and fitted model.
pub mod ridge;
/// Artifact persistence and bootstrap.
pub mod store;

use dataset::TrainingSet;
use reporter::{baseline_rss, residual_sum_of_squares, TrainingReport};
use ridge::{FittedModel, RidgeRegression};

use crate::error::ModelError;

/// A fitted model plus the report describing its fit.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    /// The model.
    pub model: FittedModel,
    /// How well it fits its training rows.
    pub report: TrainingReport,
}

/// Fits the ridge model and checks it beats the intercept-only baseline.
pub fn train(dataset: &TrainingSet, alpha: f64) -> Result<TrainedModel, ModelError> {
    let model = RidgeRegression::new(alpha).fit(dataset)?;
    let labels = dataset.labels();
    let predictions = model.predict_matrix(&dataset.feature_matrix());
    let report = TrainingReport {
        alpha,
        coefficients: *model.coefficients(),
        intercept: model.intercept(),
        rss: residual_sum_of_squares(&predictions, &labels),
        baseline_rss: baseline_rss(&labels),
        samples: dataset.len(),
    };
    if !report.beats_baseline() {
        return Err(ModelError::Training(format!(
            "fit rss {:.4} does not beat baseline {:.4}",
            report.rss, report.baseline_rss
        )));
    }
    Ok(TrainedModel { model, report })
}
