//! Attribute-level change notifications.
//!
//! Change-tracked domain objects raise add/remove events as their
//! collections are mutated, instead of paying for a full compare at
//! commit. The listener seam carries those events into the owning
//! change set's records.

use crate::changeset::ObjectChangeSet;
use crate::error::ChangeResult;
use relmap_value::Value;
use tracing::trace;

/// Receives attribute-level collection mutations as they happen.
pub trait ChangeListener {
    /// An element was added to the attribute's collection.
    fn element_added(&mut self, attribute: &str, value: &Value) -> ChangeResult<()>;

    /// An element was removed from the attribute's collection.
    fn element_removed(&mut self, attribute: &str, value: &Value) -> ChangeResult<()>;
}

/// Listener that accumulates notifications into an [`ObjectChangeSet`].
#[derive(Debug)]
pub struct ChangeSetListener<'a> {
    change_set: &'a mut ObjectChangeSet,
}

impl<'a> ChangeSetListener<'a> {
    /// Creates a listener feeding the given change set.
    pub fn new(change_set: &'a mut ObjectChangeSet) -> Self {
        Self { change_set }
    }
}

impl ChangeListener for ChangeSetListener<'_> {
    fn element_added(&mut self, attribute: &str, value: &Value) -> ChangeResult<()> {
        trace!(attribute, %value, "collection element added");
        self.change_set
            .record_mut(attribute)
            .record_addition(value.clone(), 1)
    }

    fn element_removed(&mut self, attribute: &str, value: &Value) -> ChangeResult<()> {
        trace!(attribute, %value, "collection element removed");
        self.change_set
            .record_mut(attribute)
            .record_removal(value.clone(), 1)
    }
}
