use serde::{Deserialize, Serialize};

use crate::model::{features::OperationalVector, ridge::FittedModel};

/// Score reported for a zero overrun.
pub const BASE_RISK_SCORE: f64 = 50.0;
/// Score points per crore of predicted overrun.
pub const POINTS_PER_CRORE: f64 = 8.0;
/// Score returned when no model is available.
pub const FALLBACK_RISK_SCORE: u8 = 75;
/// Overrun returned when no model is available.
pub const FALLBACK_OVERRUN_CRORES: f64 = 3.0;

/// Risk assessment for one operational snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Risk in `[0, 100]`.
    pub risk_score: u8,
    /// Predicted overrun, rounded to two decimals.
    pub predicted_overrun_crores: f64,
    /// True for the fixed fallback report.
    #[serde(default)]
    pub degraded: bool,
}

impl RiskReport {
    /// The fixed report used while the model is unavailable.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            risk_score: FALLBACK_RISK_SCORE,
            predicted_overrun_crores: FALLBACK_OVERRUN_CRORES,
            degraded: true,
        }
    }
}

/// Maps predicted overruns to bounded risk scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    /// `clamp(50 + 8 * overrun, 0, 100)`, truncated. Non-finite predictions fall back.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn score(&self, predicted_overrun: f64) -> RiskReport {
        if !predicted_overrun.is_finite() {
            return RiskReport::fallback();
        }
        let raw = predicted_overrun.mul_add(POINTS_PER_CRORE, BASE_RISK_SCORE);
        RiskReport {
            risk_score: raw.clamp(0.0, 100.0) as u8,
            predicted_overrun_crores: round_to_cents(predicted_overrun),
            degraded: false,
        }
    }

    /// Predicts with `model` when present, otherwise returns [`RiskReport::fallback`].
    #[must_use]
    pub fn assess(&self, model: Option<&FittedModel>, vector: &OperationalVector) -> RiskReport {
        model.map_or_else(RiskReport::fallback, |model| {
            self.score(model.predict(vector))
        })
    }
}

/// Two decimals, halves to even. Values too large to scale have no fractional part and pass
/// through unchanged.
fn round_to_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round_ties_even() / 100.0
    } else {
        value
    }
}
