//! Abstract data-modification events.

use relmap_value::Row;
use serde::Serialize;

/// A single data-modification event against a relation table.
///
/// Events are emitted by the replayer in a deterministic order and
/// interpreted by an executor. Criteria rows match by column subset: a
/// stored row is affected when every criteria column is present with an
/// equal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowEvent {
    /// Insert a full row.
    Insert {
        /// The row to insert; for ordered collections it includes the
        /// order column.
        row: Row,
    },
    /// Delete every row matching the criteria (value-based delete).
    Delete {
        /// Source key plus value column.
        criteria: Row,
    },
    /// Delete every row belonging to the source object.
    DeleteAll {
        /// The owning object's key columns.
        source_key: Row,
    },
    /// Delete the row holding the value at one specific position.
    DeleteAtIndex {
        /// Source key plus value column.
        criteria: Row,
        /// The persisted position to delete at.
        index: usize,
    },
    /// Move the row holding the value at `old_index` to `new_index`.
    UpdateAtIndex {
        /// Source key plus value column.
        criteria: Row,
        /// The position the row currently occupies.
        old_index: usize,
        /// The position the row must occupy.
        new_index: usize,
    },
}

impl RowEvent {
    /// Creates an insert event.
    #[must_use]
    pub fn insert(row: Row) -> Self {
        Self::Insert { row }
    }

    /// Creates a value-based delete event.
    #[must_use]
    pub fn delete(criteria: Row) -> Self {
        Self::Delete { criteria }
    }

    /// Creates a delete-all event for a source object.
    #[must_use]
    pub fn delete_all(source_key: Row) -> Self {
        Self::DeleteAll { source_key }
    }

    /// Creates a positional delete event.
    #[must_use]
    pub fn delete_at(criteria: Row, index: usize) -> Self {
        Self::DeleteAtIndex { criteria, index }
    }

    /// Creates a positional move event.
    #[must_use]
    pub fn update_at(criteria: Row, old_index: usize, new_index: usize) -> Self {
        Self::UpdateAtIndex {
            criteria,
            old_index,
            new_index,
        }
    }

    /// Short name of the event kind, for logs and assertions.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowEvent::Insert { .. } => "insert",
            RowEvent::Delete { .. } => "delete",
            RowEvent::DeleteAll { .. } => "delete_all",
            RowEvent::DeleteAtIndex { .. } => "delete_at_index",
            RowEvent::UpdateAtIndex { .. } => "update_at_index",
        }
    }
}
