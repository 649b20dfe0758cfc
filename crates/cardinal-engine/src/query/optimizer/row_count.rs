//! Join row count estimation.

use super::metadata::MetadataProvider;
use super::pkfk::PkFkJoinAnalyzer;
use crate::query::plan::{JoinOp, JoinType, LogicalOperator};
use cardinal_common::utils::error::Result;

/// Row count estimator for joins that prefers PK/FK reasoning and falls back
/// to the provider's generic formulas.
pub struct RowCountEstimator<'a, M: MetadataProvider + ?Sized> {
    provider: &'a M,
    ndv_scaling: bool,
}

impl<'a, M: MetadataProvider + ?Sized> RowCountEstimator<'a, M> {
    /// Creates an estimator over `provider`.
    pub fn new(provider: &'a M) -> Self {
        Self {
            provider,
            ndv_scaling: true,
        }
    }

    /// Enables or disables NDV scaling of PK/FK estimates.
    #[must_use]
    pub fn with_ndv_scaling(mut self, enabled: bool) -> Self {
        self.ndv_scaling = enabled;
        self
    }

    /// Estimated output rows of an inner or outer join.
    ///
    /// # Errors
    ///
    /// Propagates malformed-plan and provider errors.
    pub fn estimate_join_row_count(&self, join: &JoinOp) -> Result<f64> {
        match self.pkfk_row_count(join)? {
            Some(rows) => Ok(rows),
            None => self.provider.default_join_row_count(join),
        }
    }

    /// Estimated output rows of a semi-join.
    ///
    /// # Errors
    ///
    /// Propagates malformed-plan and provider errors.
    pub fn estimate_semi_join_row_count(&self, join: &JoinOp) -> Result<f64> {
        match self.pkfk_row_count(join)? {
            Some(rows) => Ok(rows),
            None => self.provider.default_semi_join_row_count(join),
        }
    }

    /// Estimated output rows of any operator: joins go through the join
    /// estimators, everything else straight to the provider.
    ///
    /// # Errors
    ///
    /// Propagates malformed-plan and provider errors.
    pub fn estimate_row_count(&self, op: &LogicalOperator) -> Result<f64> {
        match op {
            LogicalOperator::Join(join) if join.join_type == JoinType::Semi => {
                self.estimate_semi_join_row_count(join)
            }
            LogicalOperator::Join(join) => self.estimate_join_row_count(join),
            other => self.provider.row_count(other),
        }
    }

    fn pkfk_row_count(&self, join: &JoinOp) -> Result<Option<f64>> {
        let analyzer = PkFkJoinAnalyzer::new(self.provider).with_ndv_scaling(self.ndv_scaling);
        Ok(analyzer
            .analyze(join)?
            .map(|info| info.fk_info.row_count * info.join_selectivity()))
    }
}
