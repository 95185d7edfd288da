//! Benchmark data builders for relmap.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use relmap_value::Value;

/// Deterministic RNG so benchmark inputs are reproducible across runs.
#[must_use]
pub fn bench_rng() -> StdRng {
    StdRng::seed_from_u64(0x5EED)
}

/// A list of `len` text values drawn from an alphabet of `distinct`
/// distinct values, so duplicates appear for `distinct < len`.
#[must_use]
pub fn value_list(rng: &mut StdRng, len: usize, distinct: usize) -> Vec<Value> {
    (0..len)
        .map(|_| Value::Text(format!("v{}", rng.gen_range(0..distinct.max(1)))))
        .collect()
}

/// A shuffled copy of the list: same multiset, different order.
#[must_use]
pub fn shuffled(rng: &mut StdRng, values: &[Value]) -> Vec<Value> {
    let mut copy = values.to_vec();
    copy.shuffle(rng);
    copy
}

/// A mutated copy: roughly `ratio` of the elements replaced.
#[must_use]
pub fn mutated(rng: &mut StdRng, values: &[Value], ratio: f64) -> Vec<Value> {
    values
        .iter()
        .map(|value| {
            if rng.gen_bool(ratio) {
                Value::Text(format!("m{}", rng.gen_range(0..1000)))
            } else {
                value.clone()
            }
        })
        .collect()
}
