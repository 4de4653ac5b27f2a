use serde::{Deserialize, Serialize};

/// Number of regression features.
pub const FEATURE_COUNT: usize = 4;

/// Feature order shared by training, prediction and the persisted artifact.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "days_behind",
    "cost_variance_pct",
    "star_delay_factor",
    "crew_efficiency",
];

/// Live operational metrics for one project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperationalVector {
    /// Schedule slippage in days.
    pub days_behind: f64,
    /// Spend deviation from plan, in percent.
    pub cost_variance_pct: f64,
    /// Lead cast delay multiplier; 1.0 means no delay.
    pub star_delay_factor: f64,
    /// Crew efficiency in percent.
    pub crew_efficiency: f64,
}

impl Default for OperationalVector {
    fn default() -> Self {
        Self {
            days_behind: 0.0,
            cost_variance_pct: 0.0,
            star_delay_factor: 1.0,
            crew_efficiency: 95.0,
        }
    }
}

impl OperationalVector {
    /// Creates a vector.
    #[must_use]
    pub const fn new(
        days_behind: f64,
        cost_variance_pct: f64,
        star_delay_factor: f64,
        crew_efficiency: f64,
    ) -> Self {
        Self {
            days_behind,
            cost_variance_pct,
            star_delay_factor,
            crew_efficiency,
        }
    }

    /// Values in [`FEATURE_ORDER`].
    #[must_use]
    pub const fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.days_behind,
            self.cost_variance_pct,
            self.star_delay_factor,
            self.crew_efficiency,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_request_defaults() {
        assert_eq!(OperationalVector::default().to_features(), [0.0, 0.0, 1.0, 95.0]);
    }
}
