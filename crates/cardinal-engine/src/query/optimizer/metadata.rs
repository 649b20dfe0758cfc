//! Metadata queries consumed by cardinality estimation.
//!
//! Every statistic the join analyzer needs is requested through
//! [`MetadataProvider`], so the analyzer holds no statistics of its own and
//! tests can substitute a provider returning fixed numbers.

use crate::query::plan::{JoinOp, LogicalExpression, LogicalOperator};
use cardinal_common::types::ColumnSet;
use cardinal_common::utils::error::Result;

/// Read-only statistics about operator subtrees.
///
/// Implementations must be safe to query from several optimizer threads at
/// once.
pub trait MetadataProvider: Send + Sync {
    /// Estimated number of rows produced by `op`.
    fn row_count(&self, op: &LogicalOperator) -> Result<f64>;

    /// Fraction of `op`'s rows satisfying `predicate`, in `[0, 1]`.
    ///
    /// `predicate` is expressed over `op`'s output columns; the literal
    /// `TRUE` asks for the selectivity of any filtering inside `op` itself.
    fn selectivity(&self, op: &LogicalOperator, predicate: &LogicalExpression) -> Result<f64>;

    /// Column sets that are unique in `op`'s output. Empty when unknown.
    fn unique_keys(&self, op: &LogicalOperator) -> Result<Vec<ColumnSet>>;

    /// Number of distinct values of `columns` among the rows of `op` that
    /// satisfy `predicate`.
    fn distinct_row_count(
        &self,
        op: &LogicalOperator,
        columns: &ColumnSet,
        predicate: &LogicalExpression,
    ) -> Result<f64>;

    /// Generic row count formula for an inner or outer join.
    fn default_join_row_count(&self, join: &JoinOp) -> Result<f64>;

    /// Generic row count formula for a semi-join.
    fn default_semi_join_row_count(&self, join: &JoinOp) -> Result<f64>;
}

/// Returns true if `columns` is exactly one of `op`'s unique keys.
pub(crate) fn is_key<M: MetadataProvider + ?Sized>(
    provider: &M,
    columns: &ColumnSet,
    op: &LogicalOperator,
) -> Result<bool> {
    Ok(provider.unique_keys(op)?.iter().any(|key| key == columns))
}

/// Maps the unique keys of a projection's input onto its output.
///
/// A key survives only when each of its columns is passed through unchanged;
/// a column projected twice maps to its first output position.
pub(crate) fn project_unique_keys(
    projections: &[LogicalExpression],
    input_keys: &[ColumnSet],
) -> Vec<ColumnSet> {
    input_keys
        .iter()
        .filter_map(|key| {
            key.iter()
                .map(|column| {
                    projections
                        .iter()
                        .position(|expr| *expr == LogicalExpression::Column(column))
                })
                .collect::<Option<ColumnSet>>()
        })
        .collect()
}
