//! Property-based test generators using proptest.
//!
//! Strategies deliberately draw from a small value alphabet so that
//! duplicates, nulls, and reorderings occur often.

use proptest::prelude::*;
use relmap_value::Value;

/// Strategy for a single element value from a small alphabet.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        1 => Just(Value::Null),
        3 => (0i64..6).prop_map(Value::Integer),
        3 => "[a-d]{1,2}".prop_map(Value::Text),
    ]
}

/// Strategy for a collection snapshot of up to `max` elements.
pub fn snapshot_strategy(max: usize) -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(value_strategy(), 0..max)
}

/// Strategy for a before/after snapshot pair.
pub fn snapshot_pair_strategy(max: usize) -> impl Strategy<Value = (Vec<Value>, Vec<Value>)> {
    (snapshot_strategy(max), snapshot_strategy(max))
}

/// Strategy for a sequence and a shuffled permutation of it.
///
/// Useful for minimality checks: a permutation must reconcile through
/// moves alone.
pub fn permutation_pair_strategy(max: usize) -> impl Strategy<Value = (Vec<Value>, Vec<Value>)> {
    snapshot_strategy(max).prop_flat_map(|original| {
        let len = original.len();
        (Just(original), prop::collection::vec(any::<usize>(), len))
    })
    .prop_map(|(original, swaps)| {
        let mut shuffled = original.clone();
        let len = shuffled.len();
        if len > 1 {
            for (i, swap) in swaps.into_iter().enumerate() {
                shuffled.swap(i, swap % len);
            }
        }
        (original, shuffled)
    })
}
