//! Estimator configuration.

use serde::{Deserialize, Serialize};

/// Tunables for cardinality estimation.
///
/// The selectivity constants are the fallbacks used when no column statistics
/// cover a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Row count assumed for tables without statistics.
    pub default_row_count: u64,
    /// Selectivity of predicates no rule covers.
    pub default_selectivity: f64,
    /// Selectivity of `col = value` without statistics.
    pub equality_selectivity: f64,
    /// Selectivity of `col <> value` without statistics.
    pub inequality_selectivity: f64,
    /// Selectivity of `<`, `<=`, `>`, `>=` without statistics.
    pub range_selectivity: f64,
    /// Selectivity of `IS NULL` without statistics.
    pub is_null_selectivity: f64,
    /// Fraction of rows assumed distinct when a column has no statistics.
    pub distinct_fraction: f64,
    /// Use primary-key/foreign-key detection for join row counts.
    pub pkfk_join_estimation: bool,
    /// Scale PK/FK estimates by the ratio of key distinct counts.
    pub ndv_scaling: bool,
}

impl EstimatorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_row_count: 1000,
            default_selectivity: 0.1,
            equality_selectivity: 0.01,
            inequality_selectivity: 0.99,
            range_selectivity: 0.33,
            is_null_selectivity: 0.05,
            distinct_fraction: 0.5,
            pkfk_join_estimation: true,
            ndv_scaling: true,
        }
    }

    /// Sets the row count assumed for tables without statistics.
    #[must_use]
    pub fn with_default_row_count(mut self, rows: u64) -> Self {
        self.default_row_count = rows;
        self
    }

    /// Sets the fallback selectivity.
    #[must_use]
    pub fn with_default_selectivity(mut self, selectivity: f64) -> Self {
        self.default_selectivity = selectivity;
        self
    }

    /// Enables or disables PK/FK join estimation.
    #[must_use]
    pub fn with_pkfk_join_estimation(mut self, enabled: bool) -> Self {
        self.pkfk_join_estimation = enabled;
        self
    }

    /// Enables or disables NDV scaling of PK/FK estimates.
    #[must_use]
    pub fn with_ndv_scaling(mut self, enabled: bool) -> Self {
        self.ndv_scaling = enabled;
        self
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
