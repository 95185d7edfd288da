//! # relmap Value
//!
//! Dynamic element values for collection mappings.
//!
//! This crate provides:
//! - [`Value`], the dynamic value type held by mapped collection attributes
//! - [`Row`], an ordered column-to-value map for relation table rows
//! - [`ColumnType`] and strict value-to-column coercion
//!
//! Values have a canonical total order so that change maps keyed by value
//! iterate deterministically, and `Null` participates as an ordinary value
//! rather than a special case.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod row;
pub mod value;

pub use error::{ValueError, ValueResult};
pub use row::Row;
pub use value::{ColumnType, Value};
