//! Feature schemas
//!
//! This module defines the declared feature schema for each model version and
//! the built-in schemas shipped with the crate. Category tables, bucket
//! thresholds and derived-feature formulas are data, not code.

mod builtin;
mod definition;

pub use builtin::*;
pub use definition::*;
