//! Relation table rows.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// An ordered column-to-value map.
///
/// Rows serve three purposes in the replay pipeline: source-key rows
/// identifying the owning object, criteria rows for delete statements,
/// and full rows for inserts. Columns iterate in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column assignment.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    /// Sets a column value, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    /// Returns the value of a column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Returns true if the column is present.
    #[must_use]
    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over (column, value) pairs in column-name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.columns.iter()
    }

    /// Returns a new row combining this row's columns with `other`'s.
    ///
    /// Columns from `other` win on collision.
    #[must_use]
    pub fn merged(&self, other: &Row) -> Row {
        let mut columns = self.columns.clone();
        for (column, value) in &other.columns {
            columns.insert(column.clone(), value.clone());
        }
        Row { columns }
    }

    /// Returns true if every column of this row is present in `row` with
    /// an equal value.
    ///
    /// Used to match criteria rows against stored rows.
    #[must_use]
    pub fn is_subset_of(&self, row: &Row) -> bool {
        self.columns
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}
