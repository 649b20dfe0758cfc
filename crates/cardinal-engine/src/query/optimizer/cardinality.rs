//! Statistics-backed cardinality estimation.
//!
//! [`StatisticsProvider`] answers metadata queries from per-table statistics,
//! falling back to fixed heuristics when a table or column has none. Join row
//! counts go through [`RowCountEstimator`], so PK/FK joins nested anywhere in
//! a plan get the PK/FK estimate.

use super::metadata::{MetadataProvider, project_unique_keys};
use super::row_count::RowCountEstimator;
use crate::config::EstimatorConfig;
use crate::query::plan::{
    BinaryOp, JoinOp, JoinType, LogicalExpression, LogicalOperator, TableScanOp, UnaryOp,
};
use cardinal_common::types::ColumnSet;
use cardinal_common::utils::error::{Error, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Statistics for a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStats {
    /// Total number of rows.
    pub row_count: u64,
    /// Column statistics by column name.
    pub columns: HashMap<String, ColumnStats>,
    /// Column sets (by scan ordinal) whose values are unique.
    pub unique_keys: Vec<ColumnSet>,
}

impl TableStats {
    /// Creates new table statistics.
    #[must_use]
    pub fn new(row_count: u64) -> Self {
        Self {
            row_count,
            columns: HashMap::new(),
            unique_keys: Vec::new(),
        }
    }

    /// Adds column statistics.
    pub fn with_column(mut self, name: &str, stats: ColumnStats) -> Self {
        self.columns.insert(name.to_string(), stats);
        self
    }

    /// Declares a unique key.
    pub fn with_unique_key(mut self, key: ColumnSet) -> Self {
        self.unique_keys.push(key);
        self
    }
}

/// Statistics for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Number of distinct values.
    pub distinct_count: u64,
    /// Number of null values.
    pub null_count: u64,
    /// Minimum value (if orderable).
    pub min_value: Option<f64>,
    /// Maximum value (if orderable).
    pub max_value: Option<f64>,
}

impl ColumnStats {
    /// Creates new column statistics.
    #[must_use]
    pub fn new(distinct_count: u64) -> Self {
        Self {
            distinct_count,
            null_count: 0,
            min_value: None,
            max_value: None,
        }
    }

    /// Sets the null count.
    #[must_use]
    pub fn with_nulls(mut self, null_count: u64) -> Self {
        self.null_count = null_count;
        self
    }

    /// Sets the min/max range.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }
}

/// Metadata provider backed by table statistics.
///
/// Statistics can be replaced while other threads are estimating.
pub struct StatisticsProvider {
    config: EstimatorConfig,
    tables: RwLock<HashMap<String, TableStats>>,
}

/// A scan together with the statistics of the table it reads.
struct ScanStats<'s> {
    scan: &'s TableScanOp,
    stats: &'s TableStats,
}

impl ScanStats<'_> {
    fn column(&self, ordinal: usize) -> Option<&ColumnStats> {
        let name = self.scan.columns.get(ordinal)?;
        self.stats.columns.get(name)
    }
}

impl StatisticsProvider {
    /// Creates a provider with no statistics.
    #[must_use]
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Adds or replaces statistics for a table.
    pub fn add_table_stats(&self, name: &str, stats: TableStats) {
        self.tables.write().insert(name.to_string(), stats);
    }

    /// Returns a copy of a table's statistics.
    pub fn table_stats(&self, name: &str) -> Option<TableStats> {
        self.tables.read().get(name).cloned()
    }

    /// The estimator configuration.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    fn scan_row_count(&self, scan: &TableScanOp) -> f64 {
        match self.tables.read().get(&scan.table) {
            Some(stats) => stats.row_count as f64,
            None => self.config.default_row_count as f64,
        }
    }

    /// Rows of `op` satisfying `predicate`.
    fn filtered_row_count(&self, op: &LogicalOperator, predicate: &LogicalExpression) -> Result<f64> {
        Ok(self.row_count(op)? * self.selectivity(op, predicate)?)
    }

    /// Distinct count when nothing better is known.
    fn fallback_distinct(&self, op: &LogicalOperator, predicate: &LogicalExpression) -> Result<f64> {
        Ok((self.filtered_row_count(op, predicate)? * self.config.distinct_fraction).max(1.0))
    }

    fn scan_selectivity(&self, scan: &TableScanOp, predicate: &LogicalExpression) -> f64 {
        let tables = self.tables.read();
        let context = tables
            .get(&scan.table)
            .map(|stats| ScanStats { scan, stats });
        self.predicate_selectivity(context.as_ref(), predicate)
    }

    /// Selectivity of a predicate without any statistics.
    fn heuristic_selectivity(&self, predicate: &LogicalExpression) -> f64 {
        self.predicate_selectivity(None, predicate)
    }

    fn predicate_selectivity(
        &self,
        context: Option<&ScanStats<'_>>,
        predicate: &LogicalExpression,
    ) -> f64 {
        let selectivity = match predicate {
            LogicalExpression::Binary { left, op, right } => {
                self.binary_selectivity(context, left, *op, right)
            }
            LogicalExpression::Unary { op, operand } => {
                self.unary_selectivity(context, *op, operand)
            }
            LogicalExpression::Literal(value) => match value.as_bool() {
                Some(true) => 1.0,
                Some(false) => 0.0,
                None if value.is_null() => 0.0,
                None => self.config.default_selectivity,
            },
            _ => self.config.default_selectivity,
        };
        selectivity.clamp(0.0, 1.0)
    }

    fn binary_selectivity(
        &self,
        context: Option<&ScanStats<'_>>,
        left: &LogicalExpression,
        op: BinaryOp,
        right: &LogicalExpression,
    ) -> f64 {
        match op {
            BinaryOp::And => {
                self.predicate_selectivity(context, left) * self.predicate_selectivity(context, right)
            }
            BinaryOp::Or => {
                let l = self.predicate_selectivity(context, left);
                let r = self.predicate_selectivity(context, right);
                l + r - l * r
            }
            BinaryOp::Eq => self
                .equality_with_stats(context, left, right)
                .unwrap_or(self.config.equality_selectivity),
            BinaryOp::Ne => self
                .equality_with_stats(context, left, right)
                .map_or(self.config.inequality_selectivity, |eq| 1.0 - eq),
            op if op.is_range() => self
                .range_with_stats(context, left, op, right)
                .unwrap_or(self.config.range_selectivity),
            _ => self.config.default_selectivity,
        }
    }

    fn unary_selectivity(
        &self,
        context: Option<&ScanStats<'_>>,
        op: UnaryOp,
        operand: &LogicalExpression,
    ) -> f64 {
        match op {
            UnaryOp::Not => 1.0 - self.predicate_selectivity(context, operand),
            UnaryOp::IsNull => self
                .null_fraction(context, operand)
                .unwrap_or(self.config.is_null_selectivity),
            UnaryOp::IsNotNull => {
                1.0 - self
                    .null_fraction(context, operand)
                    .unwrap_or(self.config.is_null_selectivity)
            }
            UnaryOp::Neg => 1.0,
        }
    }

    /// `1 / ndv` for `column = literal`, `1 / max(ndv)` for `column = column`.
    fn equality_with_stats(
        &self,
        context: Option<&ScanStats<'_>>,
        left: &LogicalExpression,
        right: &LogicalExpression,
    ) -> Option<f64> {
        let context = context?;
        let ndv = match (left, right) {
            (LogicalExpression::Column(l), LogicalExpression::Column(r)) => context
                .column(*l)?
                .distinct_count
                .max(context.column(*r)?.distinct_count),
            (LogicalExpression::Column(c), LogicalExpression::Literal(_))
            | (LogicalExpression::Literal(_), LogicalExpression::Column(c)) => {
                context.column(*c)?.distinct_count
            }
            _ => return None,
        };
        (ndv > 0).then(|| 1.0 / ndv as f64)
    }

    /// Fraction of a column's `[min, max]` range selected by a comparison
    /// with a numeric literal.
    fn range_with_stats(
        &self,
        context: Option<&ScanStats<'_>>,
        left: &LogicalExpression,
        op: BinaryOp,
        right: &LogicalExpression,
    ) -> Option<f64> {
        let context = context?;
        let (column, op, value) = match (left, right) {
            (LogicalExpression::Column(c), LogicalExpression::Literal(v)) => (*c, op, v),
            (LogicalExpression::Literal(v), LogicalExpression::Column(c)) => (*c, op.reverse(), v),
            _ => return None,
        };
        let value = value.as_f64()?;
        let stats = context.column(column)?;
        let (min, max) = (stats.min_value?, stats.max_value?);

        let range = max - min;
        if range <= 0.0 {
            return Some(1.0);
        }
        let (lower, upper) = match op {
            BinaryOp::Gt | BinaryOp::Ge => (value.max(min), max),
            _ => (min, value.min(max)),
        };
        Some(((upper - lower).max(0.0) / range).min(1.0))
    }

    fn null_fraction(&self, context: Option<&ScanStats<'_>>, operand: &LogicalExpression) -> Option<f64> {
        let context = context?;
        let LogicalExpression::Column(column) = operand else {
            return None;
        };
        let stats = context.column(*column)?;
        (context.stats.row_count > 0)
            .then(|| stats.null_count as f64 / context.stats.row_count as f64)
    }

    fn scan_distinct(
        &self,
        op: &LogicalOperator,
        scan: &TableScanOp,
        columns: &ColumnSet,
        predicate: &LogicalExpression,
    ) -> Result<f64> {
        let rows = self.scan_row_count(scan);
        let filtered = rows * self.scan_selectivity(scan, predicate);

        let ndv = {
            let tables = self.tables.read();
            tables.get(&scan.table).and_then(|stats| {
                if stats.unique_keys.iter().any(|key| key.is_subset(columns)) {
                    return Some(rows);
                }
                let context = ScanStats { scan, stats };
                columns
                    .iter()
                    .map(|c| context.column(c).map(|s| s.distinct_count as f64))
                    .product::<Option<f64>>()
                    .map(|ndv| ndv.min(rows))
            })
        };

        match ndv {
            Some(ndv) => Ok(ndv.min(filtered).max(1.0)),
            None => self.fallback_distinct(op, predicate),
        }
    }

    /// Fraction of the cross product of the inputs that satisfies the join
    /// condition.
    fn join_selectivity(&self, join: &JoinOp) -> Result<f64> {
        let sys = join.system_field_count;
        let left_count = join.left.column_count();
        let left_columns = join.left_columns();
        let right_columns = join.right_columns();

        let mut selectivity = 1.0;
        for conjunct in join.condition.conjunctions() {
            let equi = match &conjunct {
                LogicalExpression::Binary {
                    left,
                    op: BinaryOp::Eq,
                    right,
                } => match (left.as_ref(), right.as_ref()) {
                    (LogicalExpression::Column(a), LogicalExpression::Column(b)) => {
                        if left_columns.contains(*a) && right_columns.contains(*b) {
                            Some((*a, *b))
                        } else if left_columns.contains(*b) && right_columns.contains(*a) {
                            Some((*b, *a))
                        } else {
                            None
                        }
                    }
                    _ => None,
                },
                _ => None,
            };

            selectivity *= match equi {
                Some((l, r)) => {
                    let truth = LogicalExpression::true_literal();
                    let left_ndv =
                        self.distinct_row_count(&join.left, &ColumnSet::of(l - sys), &truth)?;
                    let right_ndv = self.distinct_row_count(
                        &join.right,
                        &ColumnSet::of(r - sys - left_count),
                        &truth,
                    )?;
                    1.0 / left_ndv.max(right_ndv).max(1.0)
                }
                None => self.heuristic_selectivity(&conjunct),
            };
        }
        Ok(selectivity)
    }
}

impl Default for StatisticsProvider {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

impl MetadataProvider for StatisticsProvider {
    fn row_count(&self, op: &LogicalOperator) -> Result<f64> {
        match op {
            LogicalOperator::TableScan(scan) => Ok(self.scan_row_count(scan)),
            LogicalOperator::Filter(filter) => Ok((self.row_count(&filter.input)?
                * self.selectivity(&filter.input, &filter.predicate)?)
            .max(1.0)),
            LogicalOperator::Project(project) => self.row_count(&project.input),
            LogicalOperator::Limit(limit) => {
                Ok((limit.count as f64).min(self.row_count(&limit.input)?))
            }
            LogicalOperator::Aggregate(agg) => {
                if agg.group_by.is_empty() {
                    return Ok(1.0);
                }
                let width = agg.input.column_count();
                if let Some(&index) = agg.group_by.iter().find(|&&c| c >= width) {
                    return Err(Error::ColumnOutOfRange { index, width });
                }
                let group: ColumnSet = agg.group_by.iter().copied().collect();
                self.distinct_row_count(&agg.input, &group, &LogicalExpression::true_literal())
            }
            LogicalOperator::Union(union) => {
                let mut total = 0.0;
                for input in &union.inputs {
                    total += self.row_count(input)?;
                }
                Ok(if union.all { total } else { total * 0.5 })
            }
            LogicalOperator::Join(join) => {
                if self.config.pkfk_join_estimation {
                    RowCountEstimator::new(self)
                        .with_ndv_scaling(self.config.ndv_scaling)
                        .estimate_row_count(op)
                } else if join.join_type == JoinType::Semi {
                    self.default_semi_join_row_count(join)
                } else {
                    self.default_join_row_count(join)
                }
            }
        }
    }

    fn selectivity(&self, op: &LogicalOperator, predicate: &LogicalExpression) -> Result<f64> {
        match op {
            LogicalOperator::TableScan(scan) => Ok(self.scan_selectivity(scan, predicate)),
            LogicalOperator::Filter(filter) => self.selectivity(
                &filter.input,
                &LogicalExpression::conjunction([filter.predicate.clone(), predicate.clone()]),
            ),
            LogicalOperator::Project(project) => match predicate.substitute(&project.projections) {
                Some(rewritten) => self.selectivity(&project.input, &rewritten),
                None => Err(Error::ColumnOutOfRange {
                    index: predicate.max_column().unwrap_or_default(),
                    width: project.projections.len(),
                }),
            },
            LogicalOperator::Limit(limit) => self.selectivity(&limit.input, predicate),
            _ => Ok(self.heuristic_selectivity(predicate)),
        }
    }

    fn unique_keys(&self, op: &LogicalOperator) -> Result<Vec<ColumnSet>> {
        match op {
            LogicalOperator::TableScan(scan) => Ok(self
                .tables
                .read()
                .get(&scan.table)
                .map(|stats| stats.unique_keys.clone())
                .unwrap_or_default()),
            LogicalOperator::Filter(filter) => self.unique_keys(&filter.input),
            LogicalOperator::Limit(limit) => self.unique_keys(&limit.input),
            LogicalOperator::Project(project) => Ok(project_unique_keys(
                &project.projections,
                &self.unique_keys(&project.input)?,
            )),
            LogicalOperator::Aggregate(agg) => Ok(vec![ColumnSet::range(0, agg.group_by.len())]),
            LogicalOperator::Join(join) if join.join_type == JoinType::Semi => {
                let sys = join.system_field_count;
                Ok(self
                    .unique_keys(&join.left)?
                    .into_iter()
                    .map(|key| key.iter().map(|c| c + sys).collect())
                    .collect())
            }
            LogicalOperator::Join(_) | LogicalOperator::Union(_) => Ok(Vec::new()),
        }
    }

    fn distinct_row_count(
        &self,
        op: &LogicalOperator,
        columns: &ColumnSet,
        predicate: &LogicalExpression,
    ) -> Result<f64> {
        if columns.is_empty() {
            return Ok(1.0);
        }
        match op {
            LogicalOperator::TableScan(scan) => self.scan_distinct(op, scan, columns, predicate),
            LogicalOperator::Filter(filter) => self.distinct_row_count(
                &filter.input,
                columns,
                &LogicalExpression::conjunction([filter.predicate.clone(), predicate.clone()]),
            ),
            LogicalOperator::Project(project) => {
                let width = project.projections.len();
                let mut input_columns = ColumnSet::new();
                for column in columns.iter() {
                    match project.projections.get(column) {
                        Some(LogicalExpression::Column(input)) => input_columns.insert(*input),
                        Some(_) => return self.fallback_distinct(op, predicate),
                        None => return Err(Error::ColumnOutOfRange { index: column, width }),
                    }
                }
                match predicate.substitute(&project.projections) {
                    Some(rewritten) => {
                        self.distinct_row_count(&project.input, &input_columns, &rewritten)
                    }
                    None => self.fallback_distinct(op, predicate),
                }
            }
            _ => self.fallback_distinct(op, predicate),
        }
    }

    fn default_join_row_count(&self, join: &JoinOp) -> Result<f64> {
        if join.join_type == JoinType::Semi {
            return self.default_semi_join_row_count(join);
        }
        let left = self.row_count(&join.left)?;
        let right = self.row_count(&join.right)?;
        let inner = (left * right * self.join_selectivity(join)?).max(1.0);

        Ok(match join.join_type {
            JoinType::Left => inner.max(left),
            JoinType::Right => inner.max(right),
            JoinType::Full => inner.max(left.max(right)),
            JoinType::Inner | JoinType::Semi => inner,
        })
    }

    fn default_semi_join_row_count(&self, join: &JoinOp) -> Result<f64> {
        let left = self.row_count(&join.left)?;
        Ok((left * self.heuristic_selectivity(&join.condition)).max(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::plan::{AggregateOp, FilterOp, LimitOp, ProjectOp, UnionOp};

    fn scan(table: &str, columns: &[&str]) -> LogicalOperator {
        LogicalOperator::TableScan(TableScanOp {
            table: table.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        })
    }

    fn filter(predicate: LogicalExpression, input: LogicalOperator) -> LogicalOperator {
        LogicalOperator::Filter(FilterOp {
            predicate,
            input: Box::new(input),
        })
    }

    fn cmp(column: usize, op: BinaryOp, value: i64) -> LogicalExpression {
        LogicalExpression::binary(
            LogicalExpression::column(column),
            op,
            LogicalExpression::literal(value),
        )
    }

    fn people() -> StatisticsProvider {
        let provider = StatisticsProvider::default();
        provider.add_table_stats(
            "people",
            TableStats::new(1000)
                .with_column("id", ColumnStats::new(1000).with_range(0.0, 1000.0))
                .with_column("age", ColumnStats::new(50).with_range(0.0, 100.0).with_nulls(100))
                .with_unique_key(ColumnSet::of(0)),
        );
        provider
    }

    fn people_scan() -> LogicalOperator {
        scan("people", &["id", "age", "city"])
    }

    #[test]
    fn test_scan_with_stats() {
        let provider = people();
        assert!((provider.row_count(&people_scan()).unwrap() - 1000.0).abs() < 0.001);
    }

    #[test]
    fn test_scan_without_stats() {
        let provider = StatisticsProvider::new(EstimatorConfig::new().with_default_row_count(42));
        let rows = provider.row_count(&scan("unknown", &["a"])).unwrap();
        assert!((rows - 42.0).abs() < 0.001);
    }

    #[test]
    fn test_equality_uses_distinct_count() {
        let provider = people();
        let rows = provider
            .row_count(&filter(cmp(1, BinaryOp::Eq, 30), people_scan()))
            .unwrap();
        // 1000 / 50 distinct ages
        assert!((rows - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_equality_without_column_stats() {
        let provider = people();
        let sel = provider
            .selectivity(&people_scan(), &cmp(2, BinaryOp::Eq, 1))
            .unwrap();
        assert!((sel - 0.01).abs() < 0.001);
    }

    #[test]
    fn test_range_uses_min_max() {
        let provider = people();
        let sel = provider
            .selectivity(&people_scan(), &cmp(1, BinaryOp::Gt, 75))
            .unwrap();
        assert!((sel - 0.25).abs() < 0.001);

        // literal on the left: 25 > age
        let reversed = LogicalExpression::binary(
            LogicalExpression::literal(25),
            BinaryOp::Gt,
            LogicalExpression::column(1),
        );
        let sel = provider.selectivity(&people_scan(), &reversed).unwrap();
        assert!((sel - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_range_without_stats() {
        let provider = people();
        let sel = provider
            .selectivity(&people_scan(), &cmp(2, BinaryOp::Lt, 5))
            .unwrap();
        assert!((sel - 0.33).abs() < 0.001);
    }

    #[test]
    fn test_and_or_not() {
        let provider = people();
        let a = cmp(1, BinaryOp::Gt, 50);
        let b = cmp(1, BinaryOp::Lt, 10);

        let and = provider
            .selectivity(&people_scan(), &LogicalExpression::and(a.clone(), b.clone()))
            .unwrap();
        assert!((and - 0.05).abs() < 0.001);

        let or = provider
            .selectivity(
                &people_scan(),
                &LogicalExpression::binary(a.clone(), BinaryOp::Or, b),
            )
            .unwrap();
        assert!((or - (0.5 + 0.1 - 0.05)).abs() < 0.001);

        let not = provider
            .selectivity(&people_scan(), &LogicalExpression::unary(UnaryOp::Not, a))
            .unwrap();
        assert!((not - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_null_fraction() {
        let provider = people();
        let is_null = LogicalExpression::unary(UnaryOp::IsNull, LogicalExpression::column(1));
        let sel = provider.selectivity(&people_scan(), &is_null).unwrap();
        assert!((sel - 0.1).abs() < 0.001);

        let unknown = LogicalExpression::unary(UnaryOp::IsNotNull, LogicalExpression::column(2));
        let sel = provider.selectivity(&people_scan(), &unknown).unwrap();
        assert!((sel - 0.95).abs() < 0.001);
    }

    #[test]
    fn test_literals() {
        let provider = people();
        let t = provider
            .selectivity(&people_scan(), &LogicalExpression::true_literal())
            .unwrap();
        let f = provider
            .selectivity(&people_scan(), &LogicalExpression::literal(false))
            .unwrap();
        assert!((t - 1.0).abs() < 0.001);
        assert!(f.abs() < 0.001);
    }

    #[test]
    fn test_filter_folds_its_own_predicate() {
        let provider = people();
        let node = filter(cmp(1, BinaryOp::Gt, 50), people_scan());
        let sel = provider
            .selectivity(&node, &LogicalExpression::true_literal())
            .unwrap();
        assert!((sel - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_project_rewrites_predicate() {
        let provider = people();
        let project = LogicalOperator::Project(ProjectOp {
            projections: vec![LogicalExpression::column(1)],
            input: Box::new(people_scan()),
        });
        let sel = provider
            .selectivity(&project, &cmp(0, BinaryOp::Gt, 75))
            .unwrap();
        assert!((sel - 0.25).abs() < 0.001);
        assert!((provider.row_count(&project).unwrap() - 1000.0).abs() < 0.001);
    }

    #[test]
    fn test_limit_caps_cardinality() {
        let provider = people();
        let limit = LogicalOperator::Limit(LimitOp {
            count: 10,
            input: Box::new(people_scan()),
        });
        assert!((provider.row_count(&limit).unwrap() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_aggregate_cardinality() {
        let provider = people();
        let global = LogicalOperator::Aggregate(AggregateOp {
            group_by: vec![],
            aggregates: vec![],
            input: Box::new(people_scan()),
        });
        assert!((provider.row_count(&global).unwrap() - 1.0).abs() < 0.001);

        let by_age = LogicalOperator::Aggregate(AggregateOp {
            group_by: vec![1],
            aggregates: vec![],
            input: Box::new(people_scan()),
        });
        assert!((provider.row_count(&by_age).unwrap() - 50.0).abs() < 0.001);
        assert_eq!(provider.unique_keys(&by_age).unwrap(), vec![ColumnSet::of(0)]);

        let by_missing = LogicalOperator::Aggregate(AggregateOp {
            group_by: vec![usize::MAX],
            aggregates: vec![],
            input: Box::new(people_scan()),
        });
        assert_eq!(
            provider.row_count(&by_missing).unwrap_err(),
            Error::ColumnOutOfRange { index: usize::MAX, width: 3 }
        );
    }

    #[test]
    fn test_union_cardinality() {
        let provider = people();
        let union = |all| {
            LogicalOperator::Union(UnionOp {
                inputs: vec![people_scan(), people_scan()],
                all,
            })
        };
        assert!((provider.row_count(&union(true)).unwrap() - 2000.0).abs() < 0.001);
        assert!((provider.row_count(&union(false)).unwrap() - 1000.0).abs() < 0.001);
    }

    #[test]
    fn test_unique_keys_through_filter_and_project() {
        let provider = people();
        let project = LogicalOperator::Project(ProjectOp {
            projections: vec![LogicalExpression::column(1), LogicalExpression::column(0)],
            input: Box::new(filter(cmp(1, BinaryOp::Gt, 5), people_scan())),
        });
        assert_eq!(provider.unique_keys(&project).unwrap(), vec![ColumnSet::of(1)]);
    }

    #[test]
    fn test_distinct_row_count() {
        let provider = people();
        let truth = LogicalExpression::true_literal();

        let ndv = provider
            .distinct_row_count(&people_scan(), &ColumnSet::of(1), &truth)
            .unwrap();
        assert!((ndv - 50.0).abs() < 0.001);

        // a key is distinct on every filtered row
        let ndv = provider
            .distinct_row_count(&people_scan(), &ColumnSet::of(0), &cmp(1, BinaryOp::Gt, 90))
            .unwrap();
        assert!((ndv - 100.0).abs() < 0.001);

        // no statistics for city: half the rows
        let ndv = provider
            .distinct_row_count(&people_scan(), &ColumnSet::of(2), &truth)
            .unwrap();
        assert!((ndv - 500.0).abs() < 0.001);

        let ndv = provider
            .distinct_row_count(&people_scan(), &ColumnSet::new(), &truth)
            .unwrap();
        assert!((ndv - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_generic_join_formulas() {
        let provider = people();
        provider.add_table_stats(
            "visits",
            TableStats::new(10_000).with_column("person", ColumnStats::new(800)),
        );
        let visits = scan("visits", &["person", "day"]);
        // visits.person = people.id
        let condition =
            LogicalExpression::equals(LogicalExpression::column(0), LogicalExpression::column(2));

        let inner = JoinOp::new(visits.clone(), people_scan(), JoinType::Inner, condition.clone());
        // 10_000 * 1000 / max(800, 1000)
        let rows = provider.default_join_row_count(&inner).unwrap();
        assert!((rows - 10_000.0).abs() < 0.001);

        let left = JoinOp::new(
            people_scan(),
            visits,
            JoinType::Left,
            LogicalExpression::binary(
                LogicalExpression::column(0),
                BinaryOp::Lt,
                LogicalExpression::column(3),
            ),
        );
        // 1000 * 10_000 * 0.33, floored by the left side
        let rows = provider.default_join_row_count(&left).unwrap();
        assert!((rows - 3_300_000.0).abs() < 0.001);
    }

    #[test]
    fn test_semi_join_formula() {
        let provider = people();
        let semi = JoinOp::new(
            people_scan(),
            scan("visits", &["person"]),
            JoinType::Semi,
            LogicalExpression::equals(LogicalExpression::column(0), LogicalExpression::column(3)),
        );
        let rows = provider.default_semi_join_row_count(&semi).unwrap();
        assert!((rows - 10.0).abs() < 0.001);
        assert!((provider.row_count(&LogicalOperator::Join(semi)).unwrap() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_join_row_count_without_pkfk() {
        let provider = StatisticsProvider::new(EstimatorConfig::new().with_pkfk_join_estimation(false));
        provider.add_table_stats("a", TableStats::new(100));
        provider.add_table_stats("b", TableStats::new(10));
        let join = LogicalOperator::Join(JoinOp::new(
            scan("a", &["x"]),
            scan("b", &["y"]),
            JoinType::Inner,
            LogicalExpression::true_literal(),
        ));
        assert!((provider.row_count(&join).unwrap() - 1000.0).abs() < 0.001);
    }

    #[test]
    fn test_stats_can_be_replaced() {
        let provider = people();
        provider.add_table_stats("people", TableStats::new(7));
        assert_eq!(provider.table_stats("people").map(|s| s.row_count), Some(7));
        assert!((provider.row_count(&people_scan()).unwrap() - 7.0).abs() < 0.001);
    }
}
