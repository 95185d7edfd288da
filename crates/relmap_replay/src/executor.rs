//! Event execution.

use crate::error::{ReplayError, ReplayResult};
use crate::event::RowEvent;
use crate::mapping::CollectionMapping;
use relmap_value::{Row, Value};

/// Executes row events against a data source.
///
/// Implementations translate events into their data source's dialect.
/// Errors propagate opaquely and abort the enclosing commit; no retry
/// happens at this layer.
pub trait EventExecutor {
    /// Executes one event, returning the number of rows affected.
    fn execute(&mut self, event: &RowEvent) -> ReplayResult<u64>;
}

/// In-memory relation table executor.
///
/// The reference implementation used by tests and demos: a plain vector
/// of rows with subset-matching criteria, mirroring how a SQL executor
/// would treat the emitted events.
#[derive(Debug)]
pub struct InMemoryExecutor {
    order_column: Option<String>,
    value_column: String,
    rows: Vec<Row>,
}

impl InMemoryExecutor {
    /// Creates an empty table shaped like the mapping's relation table.
    #[must_use]
    pub fn for_mapping(mapping: &CollectionMapping) -> Self {
        Self {
            order_column: mapping.order_column().map(str::to_string),
            value_column: mapping.value_column().to_string(),
            rows: Vec::new(),
        }
    }

    /// All stored rows, in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values stored for a source object.
    ///
    /// Sorted by the order column when the table has one; otherwise in
    /// insertion order.
    #[must_use]
    pub fn values_for(&self, source_key: &Row) -> Vec<Value> {
        let mut matching: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| source_key.is_subset_of(row))
            .collect();

        if let Some(order_column) = &self.order_column {
            matching.sort_by_key(|row| {
                row.get(order_column)
                    .and_then(Value::as_integer)
                    .unwrap_or(i64::MAX)
            });
        }

        matching
            .into_iter()
            .filter_map(|row| row.get(&self.value_column).cloned())
            .collect()
    }

    fn require_order_column(&self) -> ReplayResult<&str> {
        self.order_column
            .as_deref()
            .ok_or_else(|| ReplayError::execution("table has no order column"))
    }

    fn remove_matching(&mut self, criteria: &Row, at_index: Option<usize>) -> u64 {
        let before = self.rows.len();
        let order_column = self.order_column.clone();
        self.rows.retain(|row| {
            let matches = criteria.is_subset_of(row)
                && at_index.map_or(true, |index| {
                    order_value(order_column.as_deref(), row) == Some(index as i64)
                });
            !matches
        });
        (before - self.rows.len()) as u64
    }
}

fn order_value(order_column: Option<&str>, row: &Row) -> Option<i64> {
    let column = order_column?;
    row.get(column).and_then(Value::as_integer)
}

impl EventExecutor for InMemoryExecutor {
    fn execute(&mut self, event: &RowEvent) -> ReplayResult<u64> {
        match event {
            RowEvent::Insert { row } => {
                self.rows.push(row.clone());
                Ok(1)
            }
            RowEvent::Delete { criteria } => Ok(self.remove_matching(criteria, None)),
            RowEvent::DeleteAll { source_key } => Ok(self.remove_matching(source_key, None)),
            RowEvent::DeleteAtIndex { criteria, index } => {
                self.require_order_column()?;
                Ok(self.remove_matching(criteria, Some(*index)))
            }
            RowEvent::UpdateAtIndex {
                criteria,
                old_index,
                new_index,
            } => {
                let order_column = self.require_order_column()?.to_string();
                let mut affected = 0;
                for row in &mut self.rows {
                    if criteria.is_subset_of(row)
                        && row.get(&order_column).and_then(Value::as_integer)
                            == Some(*old_index as i64)
                    {
                        row.set(order_column.clone(), Value::Integer(*new_index as i64));
                        affected += 1;
                    }
                }
                Ok(affected)
            }
        }
    }
}
