//! The change replayer.
//!
//! Walks a finalized collection change record and emits the minimal row
//! event sequence that reconciles the relation table with the in-memory
//! collection. Ordering is deterministic: values iterate in their
//! canonical order, index vectors in the order the differencer built them.

use crate::error::ReplayResult;
use crate::event::RowEvent;
use crate::executor::EventExecutor;
use crate::mapping::CollectionMapping;
use crate::queue::CommitQueue;
use relmap_change::{
    CollectionChangeRecord, CollectionDelta, FinalizedChange, MultisetDelta, OrderedDelta,
};
use relmap_value::{Row, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Where emitted events go.
pub enum WriteTarget<'a> {
    /// Execute each event against the data source as it is emitted.
    Immediate(&'a mut dyn EventExecutor),
    /// Queue events for the commit-time flush, keyed by the mapping.
    Deferred(&'a mut CommitQueue),
}

/// Replays finalized collection change records for one mapping.
#[derive(Debug)]
pub struct ChangeReplayer<'a> {
    mapping: &'a CollectionMapping,
}

impl<'a> ChangeReplayer<'a> {
    /// Creates a replayer for a mapping.
    #[must_use]
    pub fn new(mapping: &'a CollectionMapping) -> Self {
        Self { mapping }
    }

    /// Consumes the record and writes its events to the target.
    ///
    /// Returns the number of events emitted. With an immediate target,
    /// the first executor error aborts the sequence and propagates; with
    /// a deferred target, all events are queued for the commit flush.
    pub fn replay(
        &self,
        record: &mut CollectionChangeRecord,
        source_key: &Row,
        target: WriteTarget<'_>,
    ) -> ReplayResult<usize> {
        let change = record.consume()?;
        let events = self.events_for(&change, source_key)?;
        debug!(
            attribute = self.mapping.attribute(),
            table = self.mapping.relation_table(),
            events = events.len(),
            "replaying collection change"
        );

        let emitted = events.len();
        match target {
            WriteTarget::Immediate(executor) => {
                for event in &events {
                    executor.execute(event)?;
                }
            }
            WriteTarget::Deferred(queue) => {
                queue.enqueue_all(self.mapping.id(), events);
            }
        }
        Ok(emitted)
    }

    /// Computes the event sequence for a finalized change.
    pub fn events_for(
        &self,
        change: &FinalizedChange,
        source_key: &Row,
    ) -> ReplayResult<Vec<RowEvent>> {
        match &change.delta {
            CollectionDelta::Ordered(delta) if change.order_broken => {
                self.rebuild_events(delta, source_key)
            }
            CollectionDelta::Ordered(delta) => self.ordered_events(delta, source_key),
            CollectionDelta::Multiset(delta) => {
                self.multiset_events(delta, change.database_counts.as_ref(), source_key)
            }
        }
    }

    /// Multiset reconciliation.
    ///
    /// With stored database counts (the deferred commit path), a value
    /// with removals gets one value-wide delete followed by inserts
    /// restoring its final occurrence count, since the delete takes every
    /// matching row with it. Without counts, deletes and inserts are
    /// emitted one per occurrence, exactly as counted.
    fn multiset_events(
        &self,
        delta: &MultisetDelta,
        database_counts: Option<&BTreeMap<Value, u64>>,
        source_key: &Row,
    ) -> ReplayResult<Vec<RowEvent>> {
        let mut events = Vec::new();
        let mut restored: BTreeSet<&Value> = BTreeSet::new();

        for (value, removed) in &delta.removals {
            let criteria = self.mapping.value_row(source_key, value)?;

            match database_counts {
                Some(counts) => {
                    events.push(RowEvent::delete(criteria.clone()));

                    let persisted = counts.get(value).copied().unwrap_or(*removed);
                    let added = delta.additions.get(value).copied().unwrap_or(0);
                    let surviving = persisted.saturating_sub(*removed) + added;
                    for _ in 0..surviving {
                        events.push(RowEvent::insert(criteria.clone()));
                    }
                    restored.insert(value);
                }
                None => {
                    for _ in 0..*removed {
                        events.push(RowEvent::delete(criteria.clone()));
                    }
                }
            }
        }

        for (value, added) in &delta.additions {
            if restored.contains(value) {
                continue;
            }
            let row = self.mapping.value_row(source_key, value)?;
            for _ in 0..*added {
                events.push(RowEvent::insert(row.clone()));
            }
        }

        Ok(events)
    }

    /// Ordered reconciliation: pair removed and added indices into moves,
    /// turn the surpluses into positional deletes and inserts, and fall
    /// back to value-wide deletes for values that vanish entirely.
    fn ordered_events(
        &self,
        delta: &OrderedDelta,
        source_key: &Row,
    ) -> ReplayResult<Vec<RowEvent>> {
        let mut events = Vec::new();
        let no_indices: Vec<usize> = Vec::new();

        for (value, bucket) in &delta.changed {
            let Some(added) = bucket.added_at.as_ref() else {
                // Value fully gone: one delete takes every occurrence.
                let criteria = self.mapping.value_row(source_key, value)?;
                events.push(RowEvent::delete(criteria));
                continue;
            };
            let removed = bucket.removed_at.as_ref().unwrap_or(&no_indices);
            let criteria = self.mapping.value_row(source_key, value)?;

            for (old_index, new_index) in removed.iter().zip(added.iter()) {
                events.push(RowEvent::update_at(criteria.clone(), *old_index, *new_index));
            }
            for old_index in removed.iter().skip(added.len()) {
                events.push(RowEvent::delete_at(criteria.clone(), *old_index));
            }
            for new_index in added.iter().skip(removed.len()) {
                events.push(RowEvent::insert(self.mapping.indexed_row(
                    source_key,
                    value,
                    *new_index,
                )?));
            }
        }

        Ok(events)
    }

    /// Broken-order recovery: drop every row for the source object and
    /// rebuild the sequence wholesale. Consistency over minimality.
    fn rebuild_events(
        &self,
        delta: &OrderedDelta,
        source_key: &Row,
    ) -> ReplayResult<Vec<RowEvent>> {
        let mut events = Vec::with_capacity(delta.latest.len() + 1);
        events.push(RowEvent::delete_all(source_key.clone()));
        for (index, value) in delta.latest.iter().enumerate() {
            events.push(RowEvent::insert(self.mapping.indexed_row(
                source_key,
                value,
                index,
            )?));
        }
        Ok(events)
    }
}
