//! Multiset comparator.
//!
//! Computes a frequency-count diff between two unordered snapshots of a
//! collection attribute. Duplicate elements and null elements are ordinary
//! members: `Value::Null` is just another bucket in the count maps.

use crate::container::{Container, ContainerPolicy};
use relmap_value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// The outcome of a multiset comparison.
///
/// Applying `removals` and then `additions` to the before-snapshot, as
/// multiset operations, yields the after-snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MultisetDelta {
    /// Distinct value to count of additional occurrences needed.
    pub additions: BTreeMap<Value, u64>,
    /// Distinct value to count of occurrences to remove.
    pub removals: BTreeMap<Value, u64>,
}

impl MultisetDelta {
    /// Returns true if the delta carries no additions or removals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Total number of occurrences added.
    #[must_use]
    pub fn added_occurrences(&self) -> u64 {
        self.additions.values().sum()
    }

    /// Total number of occurrences removed.
    #[must_use]
    pub fn removed_occurrences(&self) -> u64 {
        self.removals.values().sum()
    }
}

/// Compares two collection snapshots as multisets.
///
/// A missing snapshot is treated as an empty multiset. Neither input is
/// mutated.
///
/// Returns `None` when the diff is empty and the owning object is not
/// newly created: an unchanged attribute on an existing object must not
/// produce a change record. A new object always gets a delta, even an
/// empty one, because its insert path expects a record per collection
/// attribute regardless.
#[must_use]
pub fn compare(
    policy: &dyn ContainerPolicy,
    before: Option<&Container>,
    after: Option<&Container>,
    owner_is_new: bool,
) -> Option<MultisetDelta> {
    // Frequency table of the before-snapshot.
    let mut remaining: BTreeMap<&Value, u64> = BTreeMap::new();
    if let Some(before) = before {
        for value in policy.iterate(before) {
            *remaining.entry(value).or_insert(0) += 1;
        }
    }

    // Walk the after-snapshot, consuming kept occurrences.
    let mut additions: BTreeMap<Value, u64> = BTreeMap::new();
    if let Some(after) = after {
        for value in policy.iterate(after) {
            match remaining.get_mut(value) {
                Some(count) if *count > 0 => *count -= 1,
                _ => *additions.entry(value.clone()).or_insert(0) += 1,
            }
        }
    }

    // Whatever is left of the before-counts must be removed.
    let removals: BTreeMap<Value, u64> = remaining
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(value, count)| (value.clone(), count))
        .collect();

    let delta = MultisetDelta {
        additions,
        removals,
    };

    if delta.is_empty() && !owner_is_new {
        None
    } else {
        Some(delta)
    }
}
