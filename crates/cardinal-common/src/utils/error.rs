//! Error types for Cardinal.
//!
//! Failing to recognise a primary-key/foreign-key join is not an error; the
//! variants here cover malformed plans and statistics that cannot be served.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while estimating cardinalities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The plan violates a structural invariant (built incorrectly upstream).
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// A column ordinal lies outside the row it indexes.
    #[error("column {index} out of range for a row of {width} columns")]
    ColumnOutOfRange {
        /// The offending ordinal.
        index: usize,
        /// Width of the row being indexed.
        width: usize,
    },

    /// The metadata provider could not answer a query.
    #[error("metadata unavailable: {0}")]
    Metadata(String),
}
