//! Commit-scoped deferred event queue.

use crate::error::ReplayResult;
use crate::event::RowEvent;
use crate::executor::EventExecutor;
use crate::mapping::MappingId;
use tracing::debug;

/// Defers row events until the commit flush.
///
/// Inside a unit-of-work commit, dependent writes must run after the
/// independent writes they reference. The transaction manager flushes
/// this queue at that later point. Events keep FIFO order within each
/// mapping; mappings flush in the order they first enqueued.
#[derive(Debug, Default)]
pub struct CommitQueue {
    queues: Vec<(MappingId, Vec<RowEvent>)>,
}

impl CommitQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self { queues: Vec::new() }
    }

    /// Appends one event to a mapping's queue.
    pub fn enqueue(&mut self, mapping: MappingId, event: RowEvent) {
        self.queue_for(mapping).push(event);
    }

    /// Appends a batch of events to a mapping's queue, preserving order.
    pub fn enqueue_all(&mut self, mapping: MappingId, events: impl IntoIterator<Item = RowEvent>) {
        self.queue_for(mapping).extend(events);
    }

    fn queue_for(&mut self, mapping: MappingId) -> &mut Vec<RowEvent> {
        if let Some(position) = self.queues.iter().position(|(id, _)| *id == mapping) {
            &mut self.queues[position].1
        } else {
            self.queues.push((mapping, Vec::new()));
            let last = self.queues.len() - 1;
            &mut self.queues[last].1
        }
    }

    /// Total number of queued events.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.queues.iter().map(|(_, events)| events.len()).sum()
    }

    /// Number of mappings with queued events.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.queues.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Events queued for one mapping, in enqueue order.
    #[must_use]
    pub fn events_for(&self, mapping: MappingId) -> &[RowEvent] {
        self.queues
            .iter()
            .find(|(id, _)| *id == mapping)
            .map_or(&[], |(_, events)| events)
    }

    /// Drains the queue into the executor.
    ///
    /// Executes every event, mapping by mapping, and returns the total
    /// rows affected. The first executor error aborts the flush and
    /// propagates; the enclosing transaction is expected to roll back,
    /// so no attempt is made to resume a partial flush.
    pub fn flush(&mut self, executor: &mut dyn EventExecutor) -> ReplayResult<u64> {
        let queues = std::mem::take(&mut self.queues);
        let mut affected = 0;
        for (mapping, events) in queues {
            debug!(%mapping, events = events.len(), "flushing deferred events");
            for event in events {
                affected += executor.execute(&event)?;
            }
        }
        Ok(affected)
    }
}
