//! A metadata provider returning fixed per-table numbers.

use super::metadata::{MetadataProvider, project_unique_keys};
use crate::query::plan::{JoinOp, JoinType, LogicalExpression, LogicalOperator};
use cardinal_common::types::ColumnSet;
use cardinal_common::utils::error::{Error, Result};
use hashbrown::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct FixedTable {
    row_count: f64,
    unique_keys: Vec<ColumnSet>,
    selectivity: f64,
    distinct_count: Option<f64>,
}

/// Answers every query about a subtree from the table it reads.
///
/// Selectivity is fixed per table and ignores the predicate, so tests can
/// pin down the numbers the analyzer sees.
#[derive(Debug, Default)]
pub(crate) struct FixedMetadata {
    tables: HashMap<String, FixedTable>,
    join_row_count: Option<f64>,
    semi_join_row_count: Option<f64>,
    distinct_queries: AtomicUsize,
}

impl FixedMetadata {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_table(mut self, name: &str, rows: f64, unique_keys: Vec<ColumnSet>) -> Self {
        self.tables.insert(
            name.to_string(),
            FixedTable {
                row_count: rows,
                unique_keys,
                selectivity: 1.0,
                distinct_count: None,
            },
        );
        self
    }

    pub(crate) fn with_selectivity(mut self, name: &str, selectivity: f64) -> Self {
        if let Some(table) = self.tables.get_mut(name) {
            table.selectivity = selectivity;
        }
        self
    }

    pub(crate) fn with_distinct_count(mut self, name: &str, ndv: f64) -> Self {
        if let Some(table) = self.tables.get_mut(name) {
            table.distinct_count = Some(ndv);
        }
        self
    }

    pub(crate) fn with_join_row_count(mut self, rows: f64) -> Self {
        self.join_row_count = Some(rows);
        self
    }

    pub(crate) fn with_semi_join_row_count(mut self, rows: f64) -> Self {
        self.semi_join_row_count = Some(rows);
        self
    }

    /// Number of `distinct_row_count` calls served so far.
    pub(crate) fn distinct_queries(&self) -> usize {
        self.distinct_queries.load(Ordering::Relaxed)
    }

    fn table(&self, op: &LogicalOperator) -> Result<&FixedTable> {
        let name = source_table(op)
            .ok_or_else(|| Error::Metadata(format!("no source table under {}", op.name())))?;
        self.tables
            .get(name)
            .ok_or_else(|| Error::Metadata(format!("unknown table {name}")))
    }
}

fn source_table(op: &LogicalOperator) -> Option<&str> {
    match op {
        LogicalOperator::TableScan(scan) => Some(scan.table.as_str()),
        LogicalOperator::Project(project) => source_table(&project.input),
        LogicalOperator::Filter(filter) => source_table(&filter.input),
        LogicalOperator::Aggregate(agg) => source_table(&agg.input),
        LogicalOperator::Limit(limit) => source_table(&limit.input),
        LogicalOperator::Join(_) | LogicalOperator::Union(_) => None,
    }
}

impl MetadataProvider for FixedMetadata {
    fn row_count(&self, op: &LogicalOperator) -> Result<f64> {
        match op {
            LogicalOperator::Join(join) if join.join_type == JoinType::Semi => {
                self.default_semi_join_row_count(join)
            }
            LogicalOperator::Join(join) => self.default_join_row_count(join),
            _ => Ok(self.table(op)?.row_count),
        }
    }

    fn selectivity(&self, op: &LogicalOperator, _predicate: &LogicalExpression) -> Result<f64> {
        Ok(self.table(op)?.selectivity)
    }

    fn unique_keys(&self, op: &LogicalOperator) -> Result<Vec<ColumnSet>> {
        match op {
            LogicalOperator::TableScan(_) => Ok(self.table(op)?.unique_keys.clone()),
            LogicalOperator::Filter(filter) => self.unique_keys(&filter.input),
            LogicalOperator::Project(project) => Ok(project_unique_keys(
                &project.projections,
                &self.unique_keys(&project.input)?,
            )),
            _ => Ok(Vec::new()),
        }
    }

    fn distinct_row_count(
        &self,
        op: &LogicalOperator,
        _columns: &ColumnSet,
        _predicate: &LogicalExpression,
    ) -> Result<f64> {
        self.distinct_queries.fetch_add(1, Ordering::Relaxed);
        let table = self.table(op)?;
        Ok(table.distinct_count.unwrap_or(table.row_count))
    }

    fn default_join_row_count(&self, join: &JoinOp) -> Result<f64> {
        match self.join_row_count {
            Some(rows) => Ok(rows),
            None => Ok(self.row_count(&join.left)? * self.row_count(&join.right)?),
        }
    }

    fn default_semi_join_row_count(&self, join: &JoinOp) -> Result<f64> {
        match self.semi_join_row_count {
            Some(rows) => Ok(rows),
            None => self.row_count(&join.left),
        }
    }
}
