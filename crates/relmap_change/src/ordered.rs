//! Ordered list differencer.
//!
//! For a collection persisted with an order column, computes a per-value
//! map of index deltas: which positions a value must vacate and which it
//! must occupy. A value that merely moves produces one update-at-index
//! downstream instead of a delete/insert pair.

use relmap_value::Value;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Index delta for a single distinct value.
///
/// The two fields are deliberately three-state. `None` means the value
/// never appeared on that side at all; `Some` holding an empty vector
/// means the value appeared but no index delta remains to process. The
/// replayer relies on this distinction to choose between a value-wide
/// delete and positional operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexDelta {
    /// Positions in the before-sequence the value must vacate.
    pub removed_at: Option<Vec<usize>>,
    /// Positions in the after-sequence the value must occupy.
    pub added_at: Option<Vec<usize>>,
}

impl IndexDelta {
    /// True when the value is fully gone from the after-sequence.
    #[must_use]
    pub fn is_full_removal(&self) -> bool {
        self.added_at.is_none()
    }

    /// True when the value did not appear in the before-sequence.
    #[must_use]
    pub fn is_pure_insertion(&self) -> bool {
        self.removed_at.is_none()
    }

    /// True when no index delta remains on either side.
    fn is_settled(&self) -> bool {
        self.removed_at.as_ref().map_or(true, Vec::is_empty)
            && self.added_at.as_ref().map_or(true, Vec::is_empty)
    }
}

/// The outcome of an ordered comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderedDelta {
    /// Distinct value to its index delta. Values with no remaining delta
    /// are absent.
    pub changed: BTreeMap<Value, IndexDelta>,
    /// Element count of the before-sequence, nulls included.
    pub old_size: usize,
    /// Element count of the after-sequence, nulls included.
    pub new_size: usize,
    /// The after-sequence, retained for the order-rebuild recovery path.
    pub latest: Vec<Value>,
}

impl OrderedDelta {
    /// Returns true if any index delta remains.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Diffs two ordered sequences.
///
/// Neither input is mutated. Index vectors are built in ascending index
/// order and the replayer pairs them positionally, so vector order is part
/// of the contract.
///
/// An index present in both sequences with the same value produces no
/// entry. A value whose bucket fully resolves mid-walk is remembered, so a
/// later reappearance at a different index is recognized as "still present
/// in before" (sentinel empty `removed_at`) rather than wholly new.
#[must_use]
pub fn diff(before: &[Value], after: &[Value]) -> OrderedDelta {
    let mut changed: BTreeMap<Value, IndexDelta> = BTreeMap::new();

    for (i, value) in before.iter().enumerate() {
        let bucket = changed.entry(value.clone()).or_insert_with(|| IndexDelta {
            removed_at: Some(Vec::new()),
            added_at: None,
        });
        if let Some(removed) = bucket.removed_at.as_mut() {
            removed.push(i);
        }
    }

    // Values whose bucket fully resolved during the walk. A reappearance
    // must not be mistaken for a wholly new value.
    let mut resolved: BTreeSet<Value> = BTreeSet::new();

    for (j, value) in after.iter().enumerate() {
        if !changed.contains_key(value) {
            let removed_at = if resolved.contains(value) {
                Some(Vec::new())
            } else {
                None
            };
            changed.insert(
                value.clone(),
                IndexDelta {
                    removed_at,
                    added_at: Some(vec![j]),
                },
            );
            continue;
        }

        let mut settled = false;
        if let Some(bucket) = changed.get_mut(value) {
            let kept = bucket.removed_at.as_mut().is_some_and(|removed| {
                if let Some(position) = removed.iter().position(|&i| i == j) {
                    removed.remove(position);
                    true
                } else {
                    false
                }
            });

            if kept {
                // The value occupies this exact index in both sequences.
                // It is now known to survive into the after-sequence even
                // if no index delta remains.
                if bucket.added_at.is_none() {
                    bucket.added_at = Some(Vec::new());
                }
                settled = bucket.is_settled();
            } else {
                bucket.added_at.get_or_insert_with(Vec::new).push(j);
            }
        }

        if settled {
            changed.remove(value);
            resolved.insert(value.clone());
        }
    }

    OrderedDelta {
        changed,
        old_size: before.len(),
        new_size: after.len(),
        latest: after.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    fn list(names: &[&str]) -> Vec<Value> {
        names.iter().map(|n| text(n)).collect()
    }

    #[test]
    fn identical_sequences_have_no_delta() {
        let sequence = list(&["a", "b", "a"]);
        let delta = diff(&sequence, &sequence);

        assert!(!delta.has_changes());
        assert_eq!(delta.old_size, 3);
        assert_eq!(delta.new_size, 3);
    }

    #[test]
    fn rotation_pairs_every_value() {
        let before = list(&["a", "b", "c"]);
        let after = list(&["c", "a", "b"]);

        let delta = diff(&before, &after);

        assert_eq!(delta.changed.len(), 3);
        assert_eq!(
            delta.changed.get(&text("a")).unwrap(),
            &IndexDelta {
                removed_at: Some(vec![0]),
                added_at: Some(vec![1]),
            }
        );
        assert_eq!(
            delta.changed.get(&text("b")).unwrap(),
            &IndexDelta {
                removed_at: Some(vec![1]),
                added_at: Some(vec![2]),
            }
        );
        assert_eq!(
            delta.changed.get(&text("c")).unwrap(),
            &IndexDelta {
                removed_at: Some(vec![2]),
                added_at: Some(vec![0]),
            }
        );
    }

    #[test]
    fn pure_insertion_has_no_removed_side() {
        let delta = diff(&list(&["a"]), &list(&["a", "b"]));

        let bucket = delta.changed.get(&text("b")).unwrap();
        assert!(bucket.is_pure_insertion());
        assert_eq!(bucket.added_at, Some(vec![1]));
        assert_eq!(delta.changed.get(&text("a")), None);
    }

    #[test]
    fn full_removal_has_no_added_side() {
        let delta = diff(&list(&["a", "b"]), &list(&["a"]));

        let bucket = delta.changed.get(&text("b")).unwrap();
        assert!(bucket.is_full_removal());
        assert_eq!(bucket.removed_at, Some(vec![1]));
    }

    #[test]
    fn duplicate_reinsertion_gets_sentinel_removed_set() {
        // "a" fully resolves at index 0, then reappears at index 1. The
        // reappearance must carry the empty-but-present removed side.
        let delta = diff(&list(&["a"]), &list(&["a", "a"]));

        let bucket = delta.changed.get(&text("a")).unwrap();
        assert_eq!(bucket.removed_at, Some(Vec::new()));
        assert_eq!(bucket.added_at, Some(vec![1]));
        assert!(!bucket.is_pure_insertion());
    }

    #[test]
    fn shrinking_duplicates_keep_positional_delta() {
        // One of two "a" occurrences goes away. The survivor consumes its
        // index, leaving a positional removal, not a value-wide one.
        let delta = diff(&list(&["a", "a"]), &list(&["a"]));

        let bucket = delta.changed.get(&text("a")).unwrap();
        assert_eq!(bucket.removed_at, Some(vec![1]));
        assert_eq!(bucket.added_at, Some(Vec::new()));
        assert!(!bucket.is_full_removal());
    }

    #[test]
    fn move_produces_paired_indices() {
        let delta = diff(&list(&["a", "b"]), &list(&["b", "a"]));

        assert_eq!(
            delta.changed.get(&text("a")).unwrap(),
            &IndexDelta {
                removed_at: Some(vec![0]),
                added_at: Some(vec![1]),
            }
        );
        assert_eq!(
            delta.changed.get(&text("b")).unwrap(),
            &IndexDelta {
                removed_at: Some(vec![1]),
                added_at: Some(vec![0]),
            }
        );
    }

    #[test]
    fn null_elements_are_ordinary() {
        let before = vec![text("a"), Value::Null, text("b")];
        let after = vec![text("a"), text("b")];

        let delta = diff(&before, &after);

        assert_eq!(delta.old_size, 3);
        assert_eq!(delta.new_size, 2);
        let null_bucket = delta.changed.get(&Value::Null).unwrap();
        assert!(null_bucket.is_full_removal());
        assert_eq!(null_bucket.removed_at, Some(vec![1]));
        // "b" moves from 2 to 1.
        assert_eq!(
            delta.changed.get(&text("b")).unwrap(),
            &IndexDelta {
                removed_at: Some(vec![2]),
                added_at: Some(vec![1]),
            }
        );
    }

    #[test]
    fn empty_sequences() {
        let delta = diff(&[], &[]);
        assert!(!delta.has_changes());
        assert_eq!(delta.old_size, 0);
        assert_eq!(delta.new_size, 0);
    }

    #[test]
    fn latest_is_retained() {
        let after = list(&["x", "y"]);
        let delta = diff(&[], &after);
        assert_eq!(delta.latest, after);
    }

    #[test]
    fn inputs_are_not_mutated() {
        let before = list(&["a", "b"]);
        let after = list(&["b"]);
        let before_copy = before.clone();
        let after_copy = after.clone();

        let _ = diff(&before, &after);

        assert_eq!(before, before_copy);
        assert_eq!(after, after_copy);
    }
}
