//! Canonical fixtures for reconciliation tests.

use relmap_replay::{
    CollectionMapping, EventExecutor, InMemoryExecutor, ReplayError, ReplayResult, RowEvent,
};
use relmap_value::{ColumnType, Row, Value};

/// An unordered text-tag mapping (`entry_tag(entry_id, tag)`).
pub fn tags_mapping() -> CollectionMapping {
    CollectionMapping::new(
        "tags",
        "entry_tag",
        vec!["entry_id".into()],
        "tag",
        ColumnType::Text,
    )
    .expect("fixture mapping is valid")
}

/// An ordered track mapping (`playlist_track(playlist_id, track, pos)`).
pub fn tracks_mapping() -> CollectionMapping {
    CollectionMapping::new(
        "tracks",
        "playlist_track",
        vec!["playlist_id".into()],
        "track",
        ColumnType::Text,
    )
    .expect("fixture mapping is valid")
    .with_order_column("pos")
    .expect("fixture order column is valid")
}

/// Source-key row for the tags fixture.
pub fn entry_key(id: i64) -> Row {
    Row::new().with("entry_id", Value::Integer(id))
}

/// Source-key row for the tracks fixture.
pub fn playlist_key(id: i64) -> Row {
    Row::new().with("playlist_id", Value::Integer(id))
}

/// Seeds an ordered executor table with a sequence of text values.
pub fn seed_ordered(executor: &mut InMemoryExecutor, key: &Row, values: &[Value]) {
    for (index, value) in values.iter().enumerate() {
        executor
            .execute(&RowEvent::insert(
                key.clone()
                    .with("track", value.clone())
                    .with("pos", Value::Integer(index as i64)),
            ))
            .expect("seeding an in-memory table cannot fail");
    }
}

/// Executor that records events without applying them.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    /// Events in execution order.
    pub executed: Vec<RowEvent>,
}

impl RecordingExecutor {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventExecutor for RecordingExecutor {
    fn execute(&mut self, event: &RowEvent) -> ReplayResult<u64> {
        self.executed.push(event.clone());
        Ok(1)
    }
}

/// Executor that fails after a configurable number of events.
#[derive(Debug)]
pub struct FailingExecutor {
    /// Events accepted before the failure.
    pub accept: usize,
    executed: usize,
}

impl FailingExecutor {
    /// Fails on the first event.
    #[must_use]
    pub fn immediate() -> Self {
        Self::after(0)
    }

    /// Accepts `accept` events, then fails.
    #[must_use]
    pub fn after(accept: usize) -> Self {
        Self {
            accept,
            executed: 0,
        }
    }
}

impl EventExecutor for FailingExecutor {
    fn execute(&mut self, _event: &RowEvent) -> ReplayResult<u64> {
        if self.executed >= self.accept {
            return Err(ReplayError::execution("simulated database failure"));
        }
        self.executed += 1;
        Ok(1)
    }
}

/// Serializes events to JSON for golden comparisons.
pub fn events_to_json(events: &[RowEvent]) -> String {
    serde_json::to_string_pretty(events).expect("row events serialize to JSON")
}
