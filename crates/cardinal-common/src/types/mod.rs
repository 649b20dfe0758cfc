//! Core type definitions for Cardinal.
//!
//! - Scalar literals appearing in plan expressions ([`Value`])
//! - Sets of column ordinals ([`ColumnSet`])

mod column_set;
mod value;

pub use column_set::ColumnSet;
pub use value::Value;
