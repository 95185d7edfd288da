//! Dynamic element value type.

use crate::error::{ValueError, ValueResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A dynamic value held by a mapped collection attribute.
///
/// `Value` covers the scalar types a relation table column can store.
/// `Null` is a first-class variant, so maps keyed by `Value` need no
/// side channel for null elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns true for `Value::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Integer`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the text if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `Bytes`.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns a static name for the value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Coerces this value to the given column type.
    ///
    /// Coercion is strict: identity conversions, integer/text conversions,
    /// and bool-to-integer widening are supported; anything else fails.
    /// `Null` passes through unchanged (nullable column semantics).
    pub fn coerce(&self, target: ColumnType) -> ValueResult<Value> {
        let coerced = match (self, target) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Bool(b), ColumnType::Bool) => Some(Value::Bool(*b)),
            (Value::Bool(b), ColumnType::Integer) => Some(Value::Integer(i64::from(*b))),
            (Value::Integer(i), ColumnType::Integer) => Some(Value::Integer(*i)),
            (Value::Integer(i), ColumnType::Text) => Some(Value::Text(i.to_string())),
            (Value::Text(t), ColumnType::Text) => Some(Value::Text(t.clone())),
            (Value::Text(t), ColumnType::Integer) => t.parse().ok().map(Value::Integer),
            (Value::Bytes(b), ColumnType::Bytes) => Some(Value::Bytes(b.clone())),
            _ => None,
        };

        coerced.ok_or_else(|| ValueError::conversion(self.type_name(), target))
    }

    /// Rank of the variant used as the primary sort key.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) => 2,
            Value::Text(_) => 3,
            Value::Bytes(_) => 4,
        }
    }
}

impl Ord for Value {
    /// Canonical total order: variant rank first, then content.
    ///
    /// Text and bytes compare length-first, then lexicographically. The
    /// ordering exists so that change maps keyed by `Value` iterate in a
    /// stable, deterministic order.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => a.cmp(b),
                ord => ord,
            },
            (Value::Bytes(a), Value::Bytes(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => a.cmp(b),
                ord => ord,
            },
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Text(t) => write!(f, "{t:?}"),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(t: &str) -> Self {
        Value::Text(t.to_string())
    }
}

impl From<String> for Value {
    fn from(t: String) -> Self {
        Value::Text(t)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

/// Declared type of a relation table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Boolean column.
    Bool,
    /// Integer column.
    Integer,
    /// Text column.
    Text,
    /// Byte string column.
    Bytes,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Bool => "bool",
            ColumnType::Integer => "integer",
            ColumnType::Text => "text",
            ColumnType::Bytes => "bytes",
        };
        write!(f, "{name}")
    }
}
