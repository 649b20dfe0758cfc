//! Logical query plan representation.
//!
//! Operators form a tree; scalar expressions address the columns of an
//! operator's input row by ordinal. A join's condition addresses the
//! concatenated row `[system fields | left columns | right columns]`.

use cardinal_common::types::{ColumnSet, Value};
use std::fmt;

/// A logical query plan.
#[derive(Debug, Clone)]
pub struct LogicalPlan {
    /// The root operator of the plan.
    pub root: LogicalOperator,
}

impl LogicalPlan {
    /// Creates a new logical plan with the given root operator.
    pub fn new(root: LogicalOperator) -> Self {
        Self { root }
    }
}

/// A logical operator in the query plan.
#[derive(Debug, Clone)]
pub enum LogicalOperator {
    /// Scan a base table.
    TableScan(TableScanOp),

    /// Compute output columns from input columns.
    Project(ProjectOp),

    /// Filter rows based on a predicate.
    Filter(FilterOp),

    /// Join two inputs (including semi-joins).
    Join(JoinOp),

    /// Aggregate with grouping.
    Aggregate(AggregateOp),

    /// Union of multiple inputs.
    Union(UnionOp),

    /// Limit the number of results.
    Limit(LimitOp),
}

impl LogicalOperator {
    /// Number of columns in this operator's output row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        match self {
            LogicalOperator::TableScan(scan) => scan.columns.len(),
            LogicalOperator::Project(project) => project.projections.len(),
            LogicalOperator::Filter(filter) => filter.input.column_count(),
            LogicalOperator::Join(join) => join.column_count(),
            LogicalOperator::Aggregate(agg) => agg.group_by.len() + agg.aggregates.len(),
            LogicalOperator::Union(union) => union.inputs.first().map_or(0, Self::column_count),
            LogicalOperator::Limit(limit) => limit.input.column_count(),
        }
    }

    /// Short operator name used in explain output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LogicalOperator::TableScan(_) => "TableScan",
            LogicalOperator::Project(_) => "Project",
            LogicalOperator::Filter(_) => "Filter",
            LogicalOperator::Join(join) if join.join_type == JoinType::Semi => "SemiJoin",
            LogicalOperator::Join(_) => "Join",
            LogicalOperator::Aggregate(_) => "Aggregate",
            LogicalOperator::Union(_) => "Union",
            LogicalOperator::Limit(_) => "Limit",
        }
    }

    /// Direct children of this operator.
    #[must_use]
    pub fn inputs(&self) -> Vec<&LogicalOperator> {
        match self {
            LogicalOperator::TableScan(_) => Vec::new(),
            LogicalOperator::Project(project) => vec![project.input.as_ref()],
            LogicalOperator::Filter(filter) => vec![filter.input.as_ref()],
            LogicalOperator::Join(join) => vec![join.left.as_ref(), join.right.as_ref()],
            LogicalOperator::Aggregate(agg) => vec![agg.input.as_ref()],
            LogicalOperator::Union(union) => union.inputs.iter().collect(),
            LogicalOperator::Limit(limit) => vec![limit.input.as_ref()],
        }
    }

    fn explain(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}(", "", self.name(), indent = depth * 2)?;
        match self {
            LogicalOperator::TableScan(scan) => {
                write!(f, "table=[{}], columns=[{}]", scan.table, scan.columns.join(", "))?;
            }
            LogicalOperator::Project(project) => {
                for (i, expr) in project.projections.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", expr)?;
                }
            }
            LogicalOperator::Filter(filter) => write!(f, "condition=[{}]", filter.predicate)?,
            LogicalOperator::Join(join) => {
                write!(f, "condition=[{}], joinType=[{}]", join.condition, join.join_type)?;
            }
            LogicalOperator::Aggregate(agg) => {
                let group: ColumnSet = agg.group_by.iter().copied().collect();
                write!(f, "group={}, aggregates={}", group, agg.aggregates.len())?;
            }
            LogicalOperator::Union(union) => write!(f, "all={}", union.all)?,
            LogicalOperator::Limit(limit) => write!(f, "count={}", limit.count)?,
        }
        writeln!(f, ")")?;
        for input in self.inputs() {
            input.explain(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Renders the operator tree, one operator per line, children indented.
impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.explain(f, 0)
    }
}

/// Scan a base table.
#[derive(Debug, Clone)]
pub struct TableScanOp {
    /// Table name, used to look up statistics.
    pub table: String,
    /// Output column names, in ordinal order.
    pub columns: Vec<String>,
}

/// Compute output columns from input columns.
#[derive(Debug, Clone)]
pub struct ProjectOp {
    /// One expression per output column.
    pub projections: Vec<LogicalExpression>,
    /// Input operator.
    pub input: Box<LogicalOperator>,
}

/// Filter rows based on a predicate.
#[derive(Debug, Clone)]
pub struct FilterOp {
    /// The filter predicate.
    pub predicate: LogicalExpression,
    /// Input operator.
    pub input: Box<LogicalOperator>,
}

/// Join two inputs.
#[derive(Debug, Clone)]
pub struct JoinOp {
    /// Left input.
    pub left: Box<LogicalOperator>,
    /// Right input.
    pub right: Box<LogicalOperator>,
    /// Join type.
    pub join_type: JoinType,
    /// Join condition over `[system fields | left | right]`.
    pub condition: LogicalExpression,
    /// Number of leading implicit columns in the joined row.
    pub system_field_count: usize,
}

impl JoinOp {
    /// Creates a join without system fields.
    pub fn new(
        left: LogicalOperator,
        right: LogicalOperator,
        join_type: JoinType,
        condition: LogicalExpression,
    ) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
            join_type,
            condition,
            system_field_count: 0,
        }
    }

    /// Sets the number of system fields.
    #[must_use]
    pub fn with_system_fields(mut self, count: usize) -> Self {
        self.system_field_count = count;
        self
    }

    /// Number of columns of the row produced by this join.
    ///
    /// A semi-join only emits its left input.
    #[must_use]
    pub fn column_count(&self) -> usize {
        let left = self.system_field_count + self.left.column_count();
        if self.join_type == JoinType::Semi {
            left
        } else {
            left + self.right.column_count()
        }
    }

    /// Ordinals of the left input's columns within the condition's row.
    #[must_use]
    pub fn left_columns(&self) -> ColumnSet {
        let start = self.system_field_count;
        ColumnSet::range(start, start + self.left.column_count())
    }

    /// Ordinals of the right input's columns within the condition's row.
    #[must_use]
    pub fn right_columns(&self) -> ColumnSet {
        let start = self.system_field_count + self.left.column_count();
        ColumnSet::range(start, start + self.right.column_count())
    }
}

/// Renders the join and its inputs as an explain tree.
impl fmt::Display for JoinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.join_type == JoinType::Semi {
            "SemiJoin"
        } else {
            "Join"
        };
        writeln!(
            f,
            "{}(condition=[{}], joinType=[{}])",
            name, self.condition, self.join_type
        )?;
        self.left.explain(f, 1)?;
        self.right.explain(f, 1)
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
    /// Right outer join.
    Right,
    /// Full outer join.
    Full,
    /// Semi join (returns left rows with matching right rows).
    Semi,
}

impl JoinType {
    /// Whether unmatched left rows are padded with nulls on the right.
    #[must_use]
    pub fn generates_nulls_on_right(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// Whether unmatched right rows are padded with nulls on the left.
    #[must_use]
    pub fn generates_nulls_on_left(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
            JoinType::Semi => "semi",
        };
        f.write_str(name)
    }
}

/// Aggregate with grouping.
#[derive(Debug, Clone)]
pub struct AggregateOp {
    /// Input ordinals to group by; they become output columns `0..n`.
    pub group_by: Vec<usize>,
    /// Aggregate functions, appended after the group keys.
    pub aggregates: Vec<AggregateExpr>,
    /// Input operator.
    pub input: Box<LogicalOperator>,
}

/// An aggregate expression.
#[derive(Debug, Clone)]
pub struct AggregateExpr {
    /// Aggregate function.
    pub function: AggregateFunction,
    /// Argument column, if any.
    pub column: Option<usize>,
    /// Whether to use DISTINCT.
    pub distinct: bool,
}

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// Count rows.
    Count,
    /// Sum values.
    Sum,
    /// Average values.
    Avg,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
}

/// Union of multiple result sets.
#[derive(Debug, Clone)]
pub struct UnionOp {
    /// Inputs to union together.
    pub inputs: Vec<LogicalOperator>,
    /// Whether duplicates are kept (UNION ALL).
    pub all: bool,
}

/// Limit the number of results.
#[derive(Debug, Clone)]
pub struct LimitOp {
    /// Maximum number of rows to return.
    pub count: usize,
    /// Input operator.
    pub input: Box<LogicalOperator>,
}

/// A logical (scalar) expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalExpression {
    /// Reference to an input column by ordinal.
    Column(usize),

    /// A literal value.
    Literal(Value),

    /// Binary operation.
    Binary {
        /// Left operand.
        left: Box<LogicalExpression>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<LogicalExpression>,
    },

    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<LogicalExpression>,
    },

    /// Function call.
    FunctionCall {
        /// Function name.
        name: String,
        /// Arguments.
        args: Vec<LogicalExpression>,
    },
}

impl LogicalExpression {
    /// Column reference.
    #[must_use]
    pub fn column(index: usize) -> Self {
        LogicalExpression::Column(index)
    }

    /// Literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        LogicalExpression::Literal(value.into())
    }

    /// The literal `TRUE`.
    #[must_use]
    pub fn true_literal() -> Self {
        LogicalExpression::Literal(Value::Bool(true))
    }

    /// Binary operation.
    #[must_use]
    pub fn binary(left: LogicalExpression, op: BinaryOp, right: LogicalExpression) -> Self {
        LogicalExpression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// `left = right`.
    #[must_use]
    pub fn equals(left: LogicalExpression, right: LogicalExpression) -> Self {
        Self::binary(left, BinaryOp::Eq, right)
    }

    /// `left AND right`.
    #[must_use]
    pub fn and(left: LogicalExpression, right: LogicalExpression) -> Self {
        Self::binary(left, BinaryOp::And, right)
    }

    /// Unary operation.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: LogicalExpression) -> Self {
        LogicalExpression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Returns true for the literal `TRUE`.
    #[must_use]
    pub fn is_always_true(&self) -> bool {
        matches!(self, LogicalExpression::Literal(Value::Bool(true)))
    }

    /// Columns referenced anywhere in this expression.
    #[must_use]
    pub fn referenced_columns(&self) -> ColumnSet {
        let mut columns = ColumnSet::new();
        self.collect_columns(&mut columns);
        columns
    }

    /// Highest column ordinal referenced, found without allocating.
    #[must_use]
    pub fn max_column(&self) -> Option<usize> {
        match self {
            LogicalExpression::Column(index) => Some(*index),
            LogicalExpression::Literal(_) => None,
            LogicalExpression::Binary { left, right, .. } => {
                left.max_column().max(right.max_column())
            }
            LogicalExpression::Unary { operand, .. } => operand.max_column(),
            LogicalExpression::FunctionCall { args, .. } => {
                args.iter().filter_map(LogicalExpression::max_column).max()
            }
        }
    }

    fn collect_columns(&self, columns: &mut ColumnSet) {
        match self {
            LogicalExpression::Column(index) => columns.insert(*index),
            LogicalExpression::Literal(_) => {}
            LogicalExpression::Binary { left, right, .. } => {
                left.collect_columns(columns);
                right.collect_columns(columns);
            }
            LogicalExpression::Unary { operand, .. } => operand.collect_columns(columns),
            LogicalExpression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_columns(columns);
                }
            }
        }
    }

    /// Splits an AND tree into its conjuncts.
    ///
    /// The literal `TRUE` contributes no conjunct, so a trivially true
    /// condition yields an empty list.
    #[must_use]
    pub fn conjunctions(&self) -> Vec<LogicalExpression> {
        let mut out = Vec::new();
        self.collect_conjunctions(&mut out);
        out
    }

    fn collect_conjunctions(&self, out: &mut Vec<LogicalExpression>) {
        match self {
            LogicalExpression::Binary {
                left,
                op: BinaryOp::And,
                right,
            } => {
                left.collect_conjunctions(out);
                right.collect_conjunctions(out);
            }
            expr if expr.is_always_true() => {}
            expr => out.push(expr.clone()),
        }
    }

    /// ANDs the given predicates together; an empty list yields `TRUE`.
    #[must_use]
    pub fn conjunction(predicates: impl IntoIterator<Item = LogicalExpression>) -> Self {
        predicates
            .into_iter()
            .filter(|p| !p.is_always_true())
            .reduce(Self::and)
            .unwrap_or_else(Self::true_literal)
    }

    /// Rewrites every column reference with `f`.
    #[must_use]
    pub fn map_columns(&self, f: &impl Fn(usize) -> usize) -> Self {
        match self {
            LogicalExpression::Column(index) => LogicalExpression::Column(f(*index)),
            LogicalExpression::Literal(value) => LogicalExpression::Literal(value.clone()),
            LogicalExpression::Binary { left, op, right } => LogicalExpression::Binary {
                left: Box::new(left.map_columns(f)),
                op: *op,
                right: Box::new(right.map_columns(f)),
            },
            LogicalExpression::Unary { op, operand } => LogicalExpression::Unary {
                op: *op,
                operand: Box::new(operand.map_columns(f)),
            },
            LogicalExpression::FunctionCall { name, args } => LogicalExpression::FunctionCall {
                name: name.clone(),
                args: args.iter().map(|a| a.map_columns(f)).collect(),
            },
        }
    }

    /// Replaces each column reference with the matching projection, giving an
    /// equivalent predicate over the projection's input.
    ///
    /// Returns `None` if a reference lies outside `projections`.
    #[must_use]
    pub fn substitute(&self, projections: &[LogicalExpression]) -> Option<Self> {
        Some(match self {
            LogicalExpression::Column(index) => projections.get(*index)?.clone(),
            LogicalExpression::Literal(value) => LogicalExpression::Literal(value.clone()),
            LogicalExpression::Binary { left, op, right } => LogicalExpression::Binary {
                left: Box::new(left.substitute(projections)?),
                op: *op,
                right: Box::new(right.substitute(projections)?),
            },
            LogicalExpression::Unary { op, operand } => LogicalExpression::Unary {
                op: *op,
                operand: Box::new(operand.substitute(projections)?),
            },
            LogicalExpression::FunctionCall { name, args } => LogicalExpression::FunctionCall {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|a| a.substitute(projections))
                    .collect::<Option<Vec<_>>>()?,
            },
        })
    }
}

impl fmt::Display for LogicalExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalExpression::Column(index) => write!(f, "${}", index),
            LogicalExpression::Literal(value) => write!(f, "{}", value),
            LogicalExpression::Binary { left, op, right } => {
                write!(f, "{}({}, {})", op.name(), left, right)
            }
            LogicalExpression::Unary { op, operand } => write!(f, "{}({})", op.name(), operand),
            LogicalExpression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Equality comparison (=).
    Eq,
    /// Inequality comparison (<>).
    Ne,
    /// Less than (<).
    Lt,
    /// Less than or equal (<=).
    Le,
    /// Greater than (>).
    Gt,
    /// Greater than or equal (>=).
    Ge,

    /// Logical AND.
    And,
    /// Logical OR.
    Or,

    /// Addition (+).
    Add,
    /// Subtraction (-).
    Sub,
    /// Multiplication (*).
    Mul,
    /// Division (/).
    Div,

    /// Pattern matching (LIKE).
    Like,
}

impl BinaryOp {
    /// Whether this is an ordering comparison (`<`, `<=`, `>`, `>=`).
    #[must_use]
    pub fn is_range(self) -> bool {
        matches!(self, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    /// The comparison obtained by swapping the operands.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            BinaryOp::Lt => BinaryOp::Gt,
            BinaryOp::Le => BinaryOp::Ge,
            BinaryOp::Gt => BinaryOp::Lt,
            BinaryOp::Ge => BinaryOp::Le,
            other => other,
        }
    }

    fn name(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Like => "LIKE",
        }
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Numeric negation.
    Neg,
    /// IS NULL check.
    IsNull,
    /// IS NOT NULL check.
    IsNotNull,
}

impl UnaryOp {
    fn name(self) -> &'static str {
        match self {
            UnaryOp::Not => "NOT",
            UnaryOp::Neg => "-",
            UnaryOp::IsNull => "IS NULL",
            UnaryOp::IsNotNull => "IS NOT NULL",
        }
    }
}
