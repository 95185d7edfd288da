//! Error types for the diff core.

use thiserror::Error;

/// Result type for change-tracking operations.
pub type ChangeResult<T> = Result<T, ChangeError>;

/// Errors that can occur while accumulating or finalizing changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    /// An operation was attempted in a record state that does not allow it.
    #[error("invalid transition: cannot {operation} a {state} change record")]
    InvalidTransition {
        /// Name of the state the record was in.
        state: &'static str,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// An ordered operation was attempted on an unordered collection.
    #[error("attribute '{attribute}' has no order column but an ordered change was recorded")]
    NotOrdered {
        /// The attribute in question.
        attribute: String,
    },
}

impl ChangeError {
    /// Creates an invalid-transition error.
    pub fn invalid_transition(state: &'static str, operation: &'static str) -> Self {
        Self::InvalidTransition { state, operation }
    }

    /// Creates a not-ordered error.
    pub fn not_ordered(attribute: impl Into<String>) -> Self {
        Self::NotOrdered {
            attribute: attribute.into(),
        }
    }
}
