//! Error types for change replay.

use relmap_change::ChangeError;
use relmap_value::ValueError;
use thiserror::Error;

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors that can occur while replaying collection changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// A value failed to coerce to its column's declared type.
    #[error("value conversion failed: {0}")]
    Value(#[from] ValueError),

    /// A change record was in the wrong state for replay.
    #[error("change record error: {0}")]
    Change(#[from] ChangeError),

    /// The mapping is misconfigured. Detected once, at construction.
    #[error("mapping configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// An ordered operation was requested on a mapping without an order
    /// column.
    #[error("mapping for '{attribute}' has no order column")]
    MissingOrderColumn {
        /// The attribute whose mapping lacks an order column.
        attribute: String,
    },

    /// The data source rejected an event. Propagated opaquely; the
    /// enclosing transaction is expected to roll back.
    #[error("execution failed: {message}")]
    Execution {
        /// Description from the data source.
        message: String,
    },
}

impl ReplayError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a missing-order-column error.
    pub fn missing_order_column(attribute: impl Into<String>) -> Self {
        Self::MissingOrderColumn {
            attribute: attribute.into(),
        }
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }
}
