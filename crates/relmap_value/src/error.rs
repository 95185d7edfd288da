//! Error types for relmap values.

use crate::value::ColumnType;
use thiserror::Error;

/// Result type for value operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors that can occur when handling values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A value could not be coerced to the declared column type.
    #[error("cannot convert {from} value to {target} column")]
    Conversion {
        /// Type name of the offending value.
        from: &'static str,
        /// The target column type.
        target: ColumnType,
    },
}

impl ValueError {
    /// Creates a conversion error.
    pub fn conversion(from: &'static str, target: ColumnType) -> Self {
        Self::Conversion { from, target }
    }
}
