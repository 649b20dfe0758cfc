//! Query plans and their cardinality estimation.
//!
//! - **Plan**: Logical operators and scalar expressions
//! - **Optimizer**: PK/FK-aware row count estimation over plans

pub mod optimizer;
pub mod plan;

pub use optimizer::{MetadataProvider, Optimizer, StatisticsProvider};
pub use plan::{JoinOp, JoinType, LogicalExpression, LogicalOperator, LogicalPlan};
