use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{
    dataset::TrainingSet,
    features::{OperationalVector, FEATURE_COUNT},
};
use crate::error::ModelError;

/// Default L2 penalty.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Ridge (L2-penalised least squares) fitter with an unpenalised intercept.
#[derive(Debug, Clone, Copy)]
pub struct RidgeRegression {
    alpha: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl RidgeRegression {
    /// Creates a fitter with the given penalty.
    #[must_use]
    pub const fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Penalty strength.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Closed-form fit on centred data: `(XcᵀXc + αI) w = Xcᵀyc`, `b = ȳ - x̄·w`.
    pub fn fit(&self, dataset: &TrainingSet) -> Result<FittedModel, ModelError> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ModelError::Training(format!(
                "alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }
        if dataset.is_empty() {
            return Err(ModelError::Training("training set is empty".into()));
        }
        let features = dataset.feature_matrix();
        let labels = dataset.labels();
        let feature_means = features
            .mean_axis(Axis(0))
            .ok_or_else(|| ModelError::Training("cannot average features".into()))?;
        let label_mean = labels
            .mean()
            .ok_or_else(|| ModelError::Training("cannot average labels".into()))?;

        let centred = &features - &feature_means;
        let centred_labels = &labels - label_mean;
        let mut gram = centred.t().dot(&centred);
        for idx in 0..FEATURE_COUNT {
            gram[[idx, idx]] += self.alpha;
        }
        let rhs = centred.t().dot(&centred_labels);
        let weights = cholesky_solve(&gram, &rhs).ok_or_else(|| {
            ModelError::Training("normal equations are not positive definite".into())
        })?;
        let intercept = label_mean - feature_means.dot(&weights);

        let mut coefficients = [0.0; FEATURE_COUNT];
        for (slot, value) in coefficients.iter_mut().zip(weights.iter()) {
            *slot = *value;
        }
        FittedModel::from_parts(coefficients, intercept, self.alpha)
    }
}

/// Solves `a x = b` for symmetric positive definite `a`.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut lower = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= lower[[i, k]] * lower[[j, k]];
            }
            if i == j {
                if sum <= f64::EPSILON {
                    return None;
                }
                lower[[i, i]] = sum.sqrt();
            } else {
                lower[[i, j]] = sum / lower[[j, j]];
            }
        }
    }
    // forward: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= lower[[i, k]] * y[k];
        }
        y[i] = sum / lower[[i, i]];
    }
    // backward: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= lower[[k, i]] * x[k];
        }
        x[i] = sum / lower[[i, i]];
    }
    Some(x)
}

/// Fitted overrun regressor. Immutable once built and safe to share across threads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    coefficients: [f64; FEATURE_COUNT],
    intercept: f64,
    alpha: f64,
}

impl FittedModel {
    /// Rebuilds a model from raw parameters, rejecting non-finite values.
    pub fn from_parts(
        coefficients: [f64; FEATURE_COUNT],
        intercept: f64,
        alpha: f64,
    ) -> Result<Self, ModelError> {
        if !intercept.is_finite() || coefficients.iter().any(|value| !value.is_finite()) {
            return Err(ModelError::Training("fit produced non-finite parameters".into()));
        }
        Ok(Self {
            coefficients,
            intercept,
            alpha,
        })
    }

    /// Coefficients in feature order.
    #[must_use]
    pub const fn coefficients(&self) -> &[f64; FEATURE_COUNT] {
        &self.coefficients
    }

    /// Intercept.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Penalty the model was fitted with.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Predicted overrun in crores. Unclamped.
    #[must_use]
    pub fn predict(&self, vector: &OperationalVector) -> f64 {
        vector
            .to_features()
            .iter()
            .zip(self.coefficients.iter())
            .fold(self.intercept, |acc, (feature, coef)| coef.mul_add(*feature, acc))
    }

    /// Predictions for every row of a design matrix.
    #[must_use]
    pub fn predict_matrix(&self, features: &Array2<f64>) -> Array1<f64> {
        features.dot(&Array1::from(self.coefficients.to_vec())) + self.intercept
    }
}
