//! Collection mapping descriptors.

use crate::error::{ReplayError, ReplayResult};
use relmap_value::{ColumnType, Row, Value};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a collection mapping.
///
/// The commit queue groups deferred events by this ID.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MappingId([u8; 16]);

impl MappingId {
    /// Creates a new random mapping ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    /// Creates a mapping ID from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Converts to a UUID.
    #[must_use]
    pub fn to_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }
}

impl Default for MappingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MappingId({})", self.to_uuid())
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uuid())
    }
}

/// Schema descriptor for one collection-valued attribute.
///
/// Describes the relation table holding the attribute's elements: the
/// columns carrying the owning object's key, the column carrying the
/// element value, and — for ordered collections — the column persisting
/// each element's position.
///
/// Configuration is validated once, at construction; the replayer relies
/// on a well-formed mapping.
#[derive(Debug, Clone)]
pub struct CollectionMapping {
    id: MappingId,
    attribute: String,
    relation_table: String,
    source_key_columns: Vec<String>,
    value_column: String,
    value_type: ColumnType,
    order_column: Option<String>,
}

impl CollectionMapping {
    /// Creates a mapping for an unordered collection attribute.
    pub fn new(
        attribute: impl Into<String>,
        relation_table: impl Into<String>,
        source_key_columns: Vec<String>,
        value_column: impl Into<String>,
        value_type: ColumnType,
    ) -> ReplayResult<Self> {
        let mapping = Self {
            id: MappingId::new(),
            attribute: attribute.into(),
            relation_table: relation_table.into(),
            source_key_columns,
            value_column: value_column.into(),
            value_type,
            order_column: None,
        };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Declares the order column, turning this into an ordered mapping.
    pub fn with_order_column(mut self, column: impl Into<String>) -> ReplayResult<Self> {
        let column = column.into();
        if column == self.value_column || self.source_key_columns.contains(&column) {
            return Err(ReplayError::configuration(format!(
                "order column '{column}' collides with another column of '{}'",
                self.relation_table
            )));
        }
        self.order_column = Some(column);
        Ok(self)
    }

    fn validate(&self) -> ReplayResult<()> {
        if self.attribute.is_empty() {
            return Err(ReplayError::configuration("attribute name is empty"));
        }
        if self.relation_table.is_empty() {
            return Err(ReplayError::configuration("relation table name is empty"));
        }
        if self.source_key_columns.is_empty() {
            return Err(ReplayError::configuration(format!(
                "mapping for '{}' declares no source key columns",
                self.attribute
            )));
        }
        if self.source_key_columns.contains(&self.value_column) {
            return Err(ReplayError::configuration(format!(
                "value column '{}' collides with a source key column",
                self.value_column
            )));
        }
        Ok(())
    }

    /// The mapping's unique ID.
    #[must_use]
    pub fn id(&self) -> MappingId {
        self.id
    }

    /// The mapped attribute's name.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Name of the relation table holding the collection's rows.
    #[must_use]
    pub fn relation_table(&self) -> &str {
        &self.relation_table
    }

    /// Columns carrying the owning object's key.
    #[must_use]
    pub fn source_key_columns(&self) -> &[String] {
        &self.source_key_columns
    }

    /// Column carrying the element value.
    #[must_use]
    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    /// Declared type of the value column.
    #[must_use]
    pub fn value_type(&self) -> ColumnType {
        self.value_type
    }

    /// The order column, if the collection is ordered.
    #[must_use]
    pub fn order_column(&self) -> Option<&str> {
        self.order_column.as_deref()
    }

    /// True when elements carry persisted positions.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.order_column.is_some()
    }

    /// Checks that a source-key row covers every source key column.
    pub fn check_source_key(&self, source_key: &Row) -> ReplayResult<()> {
        for column in &self.source_key_columns {
            if !source_key.contains_column(column) {
                return Err(ReplayError::configuration(format!(
                    "source key row for '{}' is missing column '{column}'",
                    self.attribute
                )));
            }
        }
        Ok(())
    }

    /// Builds a row holding the source key and the coerced element value.
    ///
    /// Serves as the insert row for unordered collections and as the
    /// criteria row for value-based deletes.
    pub fn value_row(&self, source_key: &Row, value: &Value) -> ReplayResult<Row> {
        self.check_source_key(source_key)?;
        let coerced = value.coerce(self.value_type)?;
        let mut row = source_key.clone();
        row.set(self.value_column.clone(), coerced);
        Ok(row)
    }

    /// Builds a full row for an ordered insert: source key, coerced value,
    /// and the order column set to `index`.
    pub fn indexed_row(&self, source_key: &Row, value: &Value, index: usize) -> ReplayResult<Row> {
        let order_column = self
            .order_column
            .as_ref()
            .ok_or_else(|| ReplayError::missing_order_column(&self.attribute))?;

        let mut row = self.value_row(source_key, value)?;
        row.set(order_column.clone(), Value::Integer(index as i64));
        Ok(row)
    }
}
