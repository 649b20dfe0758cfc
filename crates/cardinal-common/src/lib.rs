//! # cardinal-common
//!
//! Foundation layer for Cardinal: scalar values, column sets, and errors.
//!
//! This crate has no internal dependencies and should be kept minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions ([`Value`], [`ColumnSet`])
//! - [`utils`] - Utility functions and helpers (errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{ColumnSet, Value};
pub use utils::error::{Error, Result};
