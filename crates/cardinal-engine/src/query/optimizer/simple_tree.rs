//! Detection of "simple" key-preserving subtrees.
//!
//! A subtree is simple on a key column when it is a table scan topped only by
//! projections that pass the key through unchanged and filters whose
//! predicates are expressed purely over a unique key. Under such a tree the
//! key column keeps its identity down to the base table, so ratios of its
//! distinct counts on the two sides of a join are meaningful.

use super::metadata::{MetadataProvider, is_key};
use crate::query::plan::{LogicalExpression, LogicalOperator};
use cardinal_common::utils::error::{Error, Result};

/// Walks a subtree top-down, tracking one column of interest.
pub struct SimpleTreeChecker<'a, M: MetadataProvider + ?Sized> {
    provider: &'a M,
}

impl<'a, M: MetadataProvider + ?Sized> SimpleTreeChecker<'a, M> {
    /// Creates a checker that asks `provider` for unique keys.
    pub fn new(provider: &'a M) -> Self {
        Self { provider }
    }

    /// Returns true if `subtree` is simple on `key_column`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnOutOfRange`] if `key_column` does not exist in a
    /// projection's output or a filter references a column its input lacks,
    /// and propagates provider failures.
    pub fn is_simple(&self, subtree: &LogicalOperator, key_column: usize) -> Result<bool> {
        let mut node = subtree;
        let mut key = key_column;

        loop {
            match node {
                LogicalOperator::TableScan(_) => return Ok(true),
                LogicalOperator::Project(project) => {
                    let width = project.projections.len();
                    match project.projections.get(key) {
                        Some(LogicalExpression::Column(input)) => {
                            key = *input;
                            node = project.input.as_ref();
                        }
                        Some(expr) => {
                            tracing::trace!(key, %expr, "projection computes the join key");
                            return Ok(false);
                        }
                        None => return Err(Error::ColumnOutOfRange { index: key, width }),
                    }
                }
                LogicalOperator::Filter(filter) => {
                    let width = filter.input.column_count();
                    if let Some(index) = filter.predicate.max_column().filter(|&c| c >= width) {
                        return Err(Error::ColumnOutOfRange { index, width });
                    }
                    let columns = filter.predicate.referenced_columns();
                    if !is_key(self.provider, &columns, &filter.input)? {
                        tracing::trace!(%columns, "filter is not expressed over a unique key");
                        return Ok(false);
                    }
                    node = filter.input.as_ref();
                }
                other => {
                    tracing::trace!(operator = other.name(), "operator breaks the key chain");
                    return Ok(false);
                }
            }
        }
    }
}
