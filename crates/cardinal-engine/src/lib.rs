//! # cardinal-engine
//!
//! Join cardinality estimation that recognizes primary-key/foreign-key joins.
//!
//! ## Modules
//!
//! - [`config`] - Estimator configuration
//! - [`query`] - Logical plans, PK/FK analysis, and row count estimation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod query;

pub use config::EstimatorConfig;
pub use query::optimizer::{
    PkFkJoinAnalyzer, PkFkRelationInfo, RowCountEstimator, SimpleTreeChecker,
};
pub use query::{MetadataProvider, Optimizer, StatisticsProvider};
