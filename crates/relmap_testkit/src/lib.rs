//! # relmap Testkit
//!
//! Test utilities for relmap.
//!
//! This crate provides:
//! - Test fixtures: canonical mappings, source keys, and executors
//! - Property-based test generators using proptest
//! - A reference multiset model for conservation checks
//!
//! The crate also owns the cross-crate property and golden tests under
//! `tests/`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
