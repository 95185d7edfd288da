//! Reference multiset model.
//!
//! A deliberately naive implementation of multiset semantics, used as
//! the oracle in property tests.

use relmap_change::MultisetDelta;
use relmap_value::Value;
use std::collections::BTreeMap;

/// Occurrence counts of a value collection.
#[must_use]
pub fn multiset_counts(values: &[Value]) -> BTreeMap<Value, u64> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.clone()).or_insert(0) += 1;
    }
    counts
}

/// Applies removals, then additions, to a snapshot, as multiset ops.
#[must_use]
pub fn apply_multiset_delta(before: &[Value], delta: &MultisetDelta) -> Vec<Value> {
    let mut result = before.to_vec();
    for (value, count) in &delta.removals {
        for _ in 0..*count {
            if let Some(position) = result.iter().position(|v| v == value) {
                result.remove(position);
            }
        }
    }
    for (value, count) in &delta.additions {
        for _ in 0..*count {
            result.push(value.clone());
        }
    }
    result
}

/// True when two collections are equal as multisets.
#[must_use]
pub fn multiset_eq(left: &[Value], right: &[Value]) -> bool {
    multiset_counts(left) == multiset_counts(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_include_duplicates_and_nulls() {
        let values = vec![Value::Null, Value::Integer(1), Value::Null];
        let counts = multiset_counts(&values);
        assert_eq!(counts.get(&Value::Null), Some(&2));
        assert_eq!(counts.get(&Value::Integer(1)), Some(&1));
    }

    #[test]
    fn multiset_eq_ignores_order() {
        let left = vec![Value::Integer(1), Value::Integer(2)];
        let right = vec![Value::Integer(2), Value::Integer(1)];
        assert!(multiset_eq(&left, &right));
        assert!(!multiset_eq(&left, &left[..1]));
    }
}
