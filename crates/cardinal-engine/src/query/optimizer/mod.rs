//! Cardinality estimation for join planning.
//!
//! ## Submodules
//!
//! - [`metadata`] - The statistics interface estimation is written against
//! - [`filters`] - Classification of join predicates by input
//! - [`simple_tree`] - Detection of key-preserving subtrees
//! - [`pkfk`] - Primary-key/foreign-key join detection
//! - [`row_count`] - Join row counts using PK/FK detection
//! - [`cardinality`] - A statistics-backed metadata provider

pub mod cardinality;
pub mod filters;
pub mod metadata;
pub mod pkfk;
pub mod row_count;
pub mod simple_tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use cardinality::{ColumnStats, StatisticsProvider, TableStats};
pub use filters::{ClassifiedFilters, classify_filters};
pub use metadata::MetadataProvider;
pub use pkfk::{FkSideInfo, JoinSide, PkFkJoinAnalyzer, PkFkRelationInfo, PkSideInfo};
pub use row_count::RowCountEstimator;
pub use simple_tree::SimpleTreeChecker;

use crate::config::EstimatorConfig;
use crate::query::plan::{JoinOp, LogicalPlan};
use cardinal_common::utils::error::Result;
use rayon::prelude::*;
use std::sync::Arc;

/// Entry point for estimating plan cardinalities.
pub struct Optimizer {
    /// Statistics used for every estimate.
    statistics: Arc<StatisticsProvider>,
}

impl Optimizer {
    /// Creates an optimizer with empty statistics.
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            statistics: Arc::new(StatisticsProvider::new(config)),
        }
    }

    /// Uses a shared statistics provider.
    ///
    /// The provider carries its own [`EstimatorConfig`], which replaces the
    /// one given to [`Optimizer::new`].
    #[must_use]
    pub fn with_statistics(mut self, statistics: Arc<StatisticsProvider>) -> Self {
        self.statistics = statistics;
        self
    }

    /// Returns the statistics provider.
    #[must_use]
    pub fn statistics(&self) -> &Arc<StatisticsProvider> {
        &self.statistics
    }

    /// Estimates the number of rows a plan produces.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan is malformed.
    pub fn estimate_cardinality(&self, plan: &LogicalPlan) -> Result<f64> {
        self.statistics.row_count(&plan.root)
    }

    /// Runs PK/FK detection on a single join.
    ///
    /// # Errors
    ///
    /// Returns an error if the join condition is malformed.
    pub fn analyze_join(&self, join: &JoinOp) -> Result<Option<PkFkRelationInfo>> {
        PkFkJoinAnalyzer::new(self.statistics.as_ref())
            .with_ndv_scaling(self.statistics.config().ndv_scaling)
            .analyze(join)
    }

    /// Estimates several candidate plans in parallel.
    ///
    /// Results are in the order of `plans`.
    pub fn estimate_all(&self, plans: &[LogicalPlan]) -> Vec<Result<f64>> {
        plans
            .par_iter()
            .map(|plan| self.estimate_cardinality(plan))
            .collect()
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
