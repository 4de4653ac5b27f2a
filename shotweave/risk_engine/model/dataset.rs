use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::features::{OperationalVector, FEATURE_COUNT};

/// One labelled observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    /// Operational metrics.
    pub features: OperationalVector,
    /// Observed overrun in crores.
    pub overrun: f64,
}

// days_behind, cost_variance_pct, star_delay_factor, crew_efficiency, overrun
const BUILTIN_ROWS: [[f64; FEATURE_COUNT + 1]; 10] = [
    [0.0, 0.0, 1.0, 95.0, 0.5],
    [1.0, 5.0, 1.2, 90.0, 1.2],
    [3.0, 10.0, 1.5, 80.0, 2.5],
    [5.0, 15.0, 2.0, 70.0, 4.0],
    [2.0, 8.0, 1.1, 88.0, 1.8],
    [0.0, 2.0, 1.0, 98.0, 0.3],
    [4.0, 12.0, 1.8, 75.0, 3.5],
    [1.0, 7.0, 1.3, 86.0, 1.5],
    [6.0, 20.0, 2.5, 65.0, 5.5],
    [7.0, 25.0, 3.0, 60.0, 6.8],
];

/// Immutable training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    rows: Vec<TrainingRow>,
}

impl TrainingSet {
    /// Wraps arbitrary rows.
    #[must_use]
    pub fn new(rows: Vec<TrainingRow>) -> Self {
        Self { rows }
    }

    /// The embedded ten-row synthetic table the production model is fitted on.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ROWS
                .iter()
                .map(|&[days, variance, star, crew, overrun]| TrainingRow {
                    features: OperationalVector::new(days, variance, star, crew),
                    overrun,
                })
                .collect(),
        )
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[TrainingRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `n x 4` design matrix.
    #[must_use]
    pub fn feature_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.rows.len(), FEATURE_COUNT), |(row, col)| {
            self.rows[row].features.to_features()[col]
        })
    }

    /// Label vector.
    #[must_use]
    pub fn labels(&self) -> Array1<f64> {
        self.rows.iter().map(|row| row.overrun).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_shape() {
        let set = TrainingSet::builtin();
        assert_eq!(set.len(), 10);
        assert_eq!(set.feature_matrix().dim(), (10, 4));
        assert_eq!(set.labels()[9], 6.8);
        assert_eq!(set.feature_matrix()[[9, 3]], 60.0);
    }
}
