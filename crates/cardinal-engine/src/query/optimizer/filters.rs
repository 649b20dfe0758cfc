//! Classification of join predicates.
//!
//! A join condition is split into conjuncts; conjuncts that only touch one
//! input can be evaluated below the join on that input, provided doing so
//! cannot drop rows that outer-join semantics must preserve.

use crate::query::plan::{JoinOp, JoinType, LogicalExpression};
use cardinal_common::utils::error::{Error, Result};

/// Join predicates partitioned by where they can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFilters {
    /// Join type the predicates were classified under.
    pub join_type: JoinType,
    /// Predicates that reference both inputs (or could not be pushed).
    pub join_filters: Vec<LogicalExpression>,
    /// Predicates over the left input, in the left input's column ordinals.
    pub left_filters: Vec<LogicalExpression>,
    /// Predicates over the right input, in the right input's column ordinals.
    pub right_filters: Vec<LogicalExpression>,
}

/// Partitions `filters` (expressed over the join's row) into left-only,
/// right-only, and remaining join predicates.
///
/// Left-only predicates are moved only when `push_left` is set, right-only
/// ones only when `push_right` is set. Moved predicates are re-based onto the
/// input's own ordinals.
///
/// # Errors
///
/// Returns [`Error::InvalidPlan`] for semi-joins, whose row layout differs
/// from the condition's, and [`Error::ColumnOutOfRange`] if a predicate
/// references a column past the end of the joined row.
pub fn classify_filters(
    join: &JoinOp,
    filters: Vec<LogicalExpression>,
    push_left: bool,
    push_right: bool,
) -> Result<ClassifiedFilters> {
    if join.join_type == JoinType::Semi {
        return Err(Error::InvalidPlan(
            "cannot classify the predicates of a semi-join".to_string(),
        ));
    }

    let sys = join.system_field_count;
    let left_count = join.left.column_count();
    let width = join.column_count();
    let left_columns = join.left_columns();
    let right_columns = join.right_columns();

    let mut classified = ClassifiedFilters {
        join_type: join.join_type,
        join_filters: Vec::new(),
        left_filters: Vec::new(),
        right_filters: Vec::new(),
    };

    for filter in filters {
        if let Some(last) = filter.max_column().filter(|&last| last >= width) {
            return Err(Error::ColumnOutOfRange { index: last, width });
        }
        let columns = filter.referenced_columns();

        if push_left && columns.is_subset(&left_columns) {
            classified
                .left_filters
                .push(filter.map_columns(&|c| c - sys));
        } else if push_right && columns.is_subset(&right_columns) {
            classified
                .right_filters
                .push(filter.map_columns(&|c| c - sys - left_count));
        } else {
            classified.join_filters.push(filter);
        }
    }

    Ok(classified)
}
